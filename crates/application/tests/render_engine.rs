//! Engine behavior observed through the public API.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tessera_application::templating::{ExtensionError, FilterRun, TagRun};
use tessera_application::{
    FilterDefinition, PluginError, PluginInfo, PluginSource, PluginTemplateFilter,
    PluginTemplateTag, RenderContext, RenderEngine, RenderOptions, TagDefinition,
};
use tessera_domain::{ErrorReason, ErrorType, RenderMode};

#[derive(Default)]
struct StaticPlugins {
    tags: Mutex<Vec<PluginTemplateTag>>,
    filters: Mutex<Vec<PluginTemplateFilter>>,
}

impl StaticPlugins {
    fn add_filter(&self, plugin: &str, filter: FilterDefinition) {
        self.filters.lock().unwrap().push(PluginTemplateFilter {
            plugin: PluginInfo::new(plugin, "1.0.0"),
            filter,
        });
    }

    fn add_tag(&self, plugin: &str, tag: TagDefinition) {
        self.tags.lock().unwrap().push(PluginTemplateTag {
            plugin: PluginInfo::new(plugin, "1.0.0"),
            tag,
        });
    }

    fn remove_filters(&self) {
        self.filters.lock().unwrap().clear();
    }
}

#[async_trait]
impl PluginSource for StaticPlugins {
    async fn template_tags(&self) -> Result<Vec<PluginTemplateTag>, PluginError> {
        Ok(self.tags.lock().unwrap().clone())
    }

    async fn template_filters(&self) -> Result<Vec<PluginTemplateFilter>, PluginError> {
        Ok(self.filters.lock().unwrap().clone())
    }
}

/// Serves one deny-listed tag and one allowed tag, sleeping longer on each listing.
#[derive(Default)]
struct SlowPlugins {
    calls: AtomicUsize,
}

#[async_trait]
impl PluginSource for SlowPlugins {
    async fn template_tags(&self) -> Result<Vec<PluginTemplateTag>, PluginError> {
        let first = self.calls.fetch_add(1, Ordering::SeqCst) == 0;
        tokio::time::sleep(Duration::from_millis(if first { 10 } else { 50 })).await;
        Ok(vec![
            PluginTemplateTag {
                plugin: PluginInfo::new("insomnia-plugin-kong-portal", "1.0.0"),
                tag: TagDefinition::new("portal", TagRun::sync(|_, _| Ok("leaked".to_string()))),
            },
            PluginTemplateTag {
                plugin: PluginInfo::new("ok", "1.0.0"),
                tag: tag("fine"),
            },
        ])
    }

    async fn template_filters(&self) -> Result<Vec<PluginTemplateFilter>, PluginError> {
        Ok(Vec::new())
    }
}

fn engine_with(plugins: &Arc<StaticPlugins>) -> RenderEngine {
    RenderEngine::builder()
        .plugin_source(Arc::clone(plugins) as Arc<dyn PluginSource>)
        .build()
        .unwrap()
}

fn tag(name: &str) -> TagDefinition {
    TagDefinition::new(name, TagRun::sync(|_, raw| Ok(format!("[{raw}]"))))
}

fn context() -> RenderContext {
    RenderContext::builder().variable("word", "abc").build()
}

#[tokio::test]
async fn chain_stops_at_failing_filter() {
    let third_calls = Arc::new(AtomicUsize::new(0));
    let spy = Arc::clone(&third_calls);

    let plugins = Arc::new(StaticPlugins::default());
    plugins.add_filter("chain", FilterDefinition::new("first_step", FilterRun::sync(|_, v, _| Ok(v))));
    plugins.add_filter(
        "chain",
        FilterDefinition::new(
            "second_step",
            FilterRun::from_async(|_, _, _| async { Err(ExtensionError::new("second step failed")) }),
        ),
    );
    plugins.add_filter(
        "chain",
        FilterDefinition::new(
            "third_step",
            FilterRun::sync(move |_, v, _| {
                spy.fetch_add(1, Ordering::SeqCst);
                Ok(v)
            }),
        ),
    );

    let err = engine_with(&plugins)
        .render(
            "before {{ word | first_step | second_step | third_step }} after",
            RenderOptions::new(context()),
        )
        .await
        .unwrap_err();

    assert_eq!(err.error_type, ErrorType::Render);
    assert_eq!(err.reason, ErrorReason::Error);
    assert_eq!(err.message, "second step failed");
    assert_eq!(third_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn reload_makes_plugin_changes_visible() {
    let plugins = Arc::new(StaticPlugins::default());
    let engine = engine_with(&plugins);

    let err = engine
        .render("{{ word | shout }}", RenderOptions::new(context()))
        .await
        .unwrap_err();
    assert_eq!(err.error_type, ErrorType::Parse);

    plugins.add_filter(
        "loud",
        FilterDefinition::new(
            "shout",
            FilterRun::sync(|_, v, _| Ok(json!(format!("{}!", v.as_str().unwrap_or_default())))),
        ),
    );

    // Still cached until reload.
    assert!(engine.render("{{ word | shout }}", RenderOptions::new(context())).await.is_err());

    engine.reload();
    let out = engine
        .render("{{ word | shout }}", RenderOptions::new(context()))
        .await
        .unwrap();
    assert_eq!(out, "abc!");

    plugins.remove_filters();
    engine.reload();
    assert!(engine.render("{{ word | shout }}", RenderOptions::new(context())).await.is_err());
}

#[tokio::test]
async fn tag_listing_sorted_and_deprecations_hidden() {
    let plugins = Arc::new(StaticPlugins::default());
    plugins.add_tag("p", tag("zeta"));
    plugins.add_tag("p", tag("alpha").with_priority(150));
    plugins.add_tag("p", tag("retired").deprecated());
    plugins.add_tag("p", tag("beta").with_priority(150));
    plugins.add_tag("p", tag("first").with_priority(-1));

    let engine = engine_with(&plugins);
    let listed: Vec<(String, i64)> = engine
        .tag_definitions()
        .await
        .unwrap()
        .into_iter()
        .map(|t| (t.name, t.priority))
        .collect();

    assert_eq!(
        listed,
        vec![
            ("first".to_string(), -1),
            ("zeta".to_string(), 0),
            ("alpha".to_string(), 150),
            ("beta".to_string(), 150),
        ]
    );

    let out = engine
        .render("{% retired 'still works' %}", RenderOptions::new(context()))
        .await
        .unwrap();
    assert_eq!(out, "['still works']");
}

#[tokio::test]
async fn ignored_plugins_are_not_registered() {
    let plugins = Arc::new(StaticPlugins::default());
    plugins.add_tag("insomnia-plugin-kong-portal", tag("portal"));
    plugins.add_tag("ok", tag("fine"));
    plugins.add_filter(
        "insomnia-plugin-kong-declarative-config",
        FilterDefinition::new("kong", FilterRun::sync(|_, v, _| Ok(v))),
    );

    let engine = engine_with(&plugins);
    let tags: Vec<String> = engine.tag_definitions().await.unwrap().into_iter().map(|t| t.name).collect();
    assert_eq!(tags, vec!["fine".to_string()]);
    assert!(engine.filter_definitions().await.unwrap().iter().all(|f| f.name != "kong"));
}

#[tokio::test]
async fn deny_list_holds_for_concurrent_mode_builds() {
    let engine = RenderEngine::builder()
        .plugin_source(Arc::new(SlowPlugins::default()))
        .build()
        .unwrap();

    let (all, tags) = tokio::join!(
        engine.render("{% portal %}", RenderOptions::default()),
        engine.render("{% portal %}", RenderOptions::default().with_mode(RenderMode::Tags)),
    );
    assert_eq!(all.unwrap_err().message, "unknown block tag: portal");
    assert_eq!(tags.unwrap_err().message, "unknown block tag: portal");

    let out = engine
        .render("{% fine 'x' %}", RenderOptions::default().with_mode(RenderMode::Tags))
        .await
        .unwrap();
    assert_eq!(out, "['x']");
    assert_eq!(engine.manager().build_count(), 2);
}

#[tokio::test]
async fn plugin_filters_flagged_in_listing() {
    let plugins = Arc::new(StaticPlugins::default());
    plugins.add_filter("p", FilterDefinition::new("custom", FilterRun::sync(|_, v, _| Ok(v))));
    let filters = engine_with(&plugins).filter_definitions().await.unwrap();

    let custom = filters.iter().find(|f| f.name == "custom").expect("listed");
    assert!(custom.is_plugin);
    assert!(filters.iter().filter(|f| f.name != "custom").all(|f| !f.is_plugin));
    assert_eq!(filters.last().map(|f| f.name.as_str()), Some("custom"));
}

#[tokio::test]
async fn helper_exposes_plugin_and_meta() {
    let plugins = Arc::new(StaticPlugins::default());
    plugins.add_tag(
        "inspector",
        TagDefinition::new(
            "whoami",
            TagRun::sync(|helper, _| {
                let plugin = helper.plugin().map(|p| p.name.clone()).unwrap_or_default();
                let meta = helper.meta().to_value();
                Ok(format!("{plugin}:{}:{}", meta["environmentId"].as_str().unwrap_or(""), meta["purpose"]))
            }),
        ),
    );
    let ctx = RenderContext::builder().purpose("preview").build();
    let out = engine_with(&plugins)
        .render("{% whoami %}", RenderOptions::new(ctx))
        .await
        .unwrap();
    assert_eq!(out, r#"inspector:n/a:"preview""#);
}

#[tokio::test]
async fn tags_resolve_their_arguments() {
    let plugins = Arc::new(StaticPlugins::default());
    plugins.add_tag(
        "p",
        TagDefinition::new(
            "concat",
            TagRun::sync(|helper, raw| {
                let values = helper.resolve_arguments(raw)?;
                Ok(values
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        Value::Null => "<null>".to_string(),
                        other => other.to_string(),
                    })
                    .collect::<String>())
            }),
        ),
    );
    let out = engine_with(&plugins)
        .render(r#"{% concat word, "-", 2, missing %}"#, RenderOptions::new(context()))
        .await
        .unwrap();
    assert_eq!(out, "abc-2<null>");
}

#[tokio::test]
async fn concurrent_renders_share_one_build_per_mode() {
    let engine = RenderEngine::builder().build().unwrap();
    let renders = (0..8).map(|i| {
        let engine = engine.clone();
        tokio::spawn(async move {
            let ctx = RenderContext::builder().variable("i", i).build();
            engine.render("{{ i }}", RenderOptions::new(ctx)).await
        })
    });

    for (i, handle) in renders.collect::<Vec<_>>().into_iter().enumerate() {
        assert_eq!(handle.await.unwrap().unwrap(), i.to_string());
    }
    assert_eq!(engine.manager().build_count(), 1);

    engine
        .render("{{ 1 }}", RenderOptions::default().with_mode(RenderMode::Tags))
        .await
        .unwrap();
    assert_eq!(engine.manager().build_count(), 2);
}
