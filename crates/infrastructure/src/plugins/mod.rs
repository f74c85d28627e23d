//! Plugin source and the plugins bundled with the binary.

mod encoding;
mod generators;
mod lookup;
mod registry;

pub use encoding::base64_tag;
pub use generators::{now_tag, random_tag, uuid_tag};
pub use lookup::{cookie_tag, response_tag};
pub use registry::{Plugin, PluginRegistry};

/// Version reported for bundled plugins.
pub const BUNDLED_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The tag plugins shipped with Tessera, one plugin per tag.
#[must_use]
pub fn bundled_plugins() -> Vec<Plugin> {
    vec![
        Plugin::new("tessera-plugin-uuid", BUNDLED_VERSION).with_tag(uuid_tag()),
        Plugin::new("tessera-plugin-now", BUNDLED_VERSION).with_tag(now_tag()),
        Plugin::new("tessera-plugin-random", BUNDLED_VERSION).with_tag(random_tag()),
        Plugin::new("tessera-plugin-base64", BUNDLED_VERSION).with_tag(base64_tag()),
        Plugin::new("tessera-plugin-response", BUNDLED_VERSION).with_tag(response_tag()),
        Plugin::new("tessera-plugin-cookie", BUNDLED_VERSION).with_tag(cookie_tag()),
    ]
}
