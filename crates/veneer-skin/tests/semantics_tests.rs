/*
 * semantics_tests.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Rendering semantics: dispatch, inheritance, scoping and concurrency.
 */

use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use veneer_skin::{MemoryResolver, SkinContext, SkinEnvironment, SkinValue};

fn env_with(skins: &[(&str, &str)]) -> SkinEnvironment {
    SkinEnvironment::new(Arc::new(MemoryResolver::with_skins(skins.iter().copied())))
}

fn render(source: &str, ctx: &SkinContext) -> String {
    let env = env_with(&[]);
    let skin = env.load_source(source).unwrap();
    env.render(&skin, ctx).unwrap()
}

fn context(data: serde_json::Value) -> SkinContext {
    SkinContext::from_json(data).unwrap()
}

#[test]
fn test_value_interpolation() {
    let ctx = context(json!({"value": "HERE"}));
    assert_eq!(render("before <% value %> after", &ctx), "before HERE after");
}

#[test]
fn test_macro_dispatch() {
    let mut ctx = SkinContext::new();
    ctx.register_macro("foo", |_| Ok(SkinValue::from("HERE")));
    assert_eq!(render("<% foo %>", &ctx), "HERE");
}

#[test]
fn test_filter_dispatch_ignores_input() {
    let mut ctx = context(json!({"x": "ignored"}));
    ctx.register_filter("foo", |_, _| Ok(SkinValue::from("HERE")));
    assert_eq!(render("<% x | foo %>", &ctx), "HERE");
    assert_eq!(render("<% undefined | foo %>", &ctx), "HERE");
}

#[test]
fn test_for_with_fragment_body() {
    let ctx = context(json!({"xs": ["a", "b"]}));
    assert_eq!(
        render("<% for x in <% xs %> render item %><% subskin item %><% x %>,", &ctx),
        "a,b,"
    );
}

#[test]
fn test_if_with_fragment_body() {
    let source = "<% if <% x %> render tt %><% subskin tt %>tt";
    assert_eq!(render(source, &context(json!({"x": true}))), "tt");
    assert_eq!(render(source, &context(json!({"x": false}))), "");
}

#[test]
fn test_extends_only_child_matches_parent() {
    let env = env_with(&[
        ("parent", "<% greeting %>, <% render who %>!<% subskin who %>world"),
        ("child", "<% extends parent %>"),
    ]);
    let ctx = context(json!({"greeting": "Hello"}));
    let parent = env.load("parent").unwrap();
    let child = env.load("child").unwrap();

    assert_eq!(env.render(&parent, &ctx).unwrap(), "Hello, world!");
    assert_eq!(env.render(&child, &ctx).unwrap(), env.render(&parent, &ctx).unwrap());
}

#[test]
fn test_inherited_layout_renders_child_fragments() {
    let env = env_with(&[
        ("layout", "[<% render body %>]<% subskin body %>default"),
        ("page", "<% extends layout %>\n<% subskin body %>custom"),
        ("grandchild", "<% extends page %>"),
    ]);
    let ctx = SkinContext::new();

    let page = env.load("page").unwrap();
    assert_eq!(env.render(&page, &ctx).unwrap(), "[custom]");
    // Two levels of delegation
    let grandchild = env.load("grandchild").unwrap();
    assert_eq!(env.render(&grandchild, &ctx).unwrap(), "[custom]");
}

#[test]
fn test_child_main_replaces_parent_main() {
    let env = env_with(&[
        ("parent", "parent main<% subskin a %>A"),
        ("child", "<% extends parent %>child main <% render a %>"),
    ]);
    let child = env.load("child").unwrap();
    assert_eq!(
        env.render(&child, &SkinContext::new()).unwrap(),
        "child main A"
    );
}

#[test]
fn test_external_fragment_relative_to_origin() {
    let env = env_with(&[
        ("site/page", "<% render ./footer %>|<% render footer %>"),
        ("site/footer", "(<% year %>)"),
    ]);
    let skin = env.load("site/page").unwrap();
    let ctx = context(json!({"year": 2025}));
    assert_eq!(env.render(&skin, &ctx).unwrap(), "(2025)|(2025)");
}

#[test]
fn test_filters_run_left_to_right() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut ctx = context(json!({"v": "v"}));
    for name in ["f1", "f2"] {
        let seen = Arc::clone(&seen);
        ctx.register_filter(name, move |value, _| {
            seen.lock().unwrap().push(format!("{name}({})", value.render()));
            Ok(SkinValue::from(format!("{}>{name}", value.render())))
        });
    }

    assert_eq!(render("<% v | f1 | f2 %>", &ctx), "v>f1>f2");
    assert_eq!(*seen.lock().unwrap(), vec!["f1(v)", "f2(v>f1)"]);
}

#[test]
fn test_or_does_not_evaluate_right_side() {
    let evaluated = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&evaluated);
    let mut ctx = context(json!({"left": true}));
    ctx.register_macro("right", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(SkinValue::Bool(true))
    });

    assert_eq!(
        render("<% if <% left %> or <% right %> render yes %><% subskin yes %>yes", &ctx),
        "yes"
    );
    assert_eq!(evaluated.load(Ordering::SeqCst), 0);
}

#[test]
fn test_loop_variable_does_not_leak() {
    let ctx = context(json!({"xs": [1, 2, 3], "x": "outer"}));
    assert_eq!(
        render("<% for x in <% xs %> x %> <% x %> [<% index %>]", &ctx),
        "123 outer []"
    );
}

#[test]
fn test_context_is_not_mutated() {
    let ctx = context(json!({"xs": ["a"], "name": "kept"}));
    render("<% for name in <% xs %> name %><% set {name: other} name %>", &ctx);
    assert_eq!(ctx.get("name"), Some(&SkinValue::from("kept")));
    assert!(ctx.get("index").is_none());
}

#[test]
fn test_rendering_is_deterministic() {
    let env = env_with(&[(
        "page",
        "<% for x in <% xs %> render row separator=',' %><% subskin row %><% index %>:<% x | uppercase %>",
    )]);
    let skin = env.load("page").unwrap();
    let ctx = context(json!({"xs": ["a", "b", "c"]}));

    let first = env.render(&skin, &ctx).unwrap();
    assert_eq!(first, "0:A,1:B,2:C");
    for _ in 0..3 {
        assert_eq!(env.render(&skin, &ctx).unwrap(), first);
    }
}

#[test]
fn test_concurrent_renders_share_one_skin() {
    let env = env_with(&[
        ("layout", "<% render body %><% subskin body %>default"),
        ("page", "<% extends layout %><% subskin body %><% for x in <% xs %> x separator='-' %>"),
    ]);
    let skin = env.load("page").unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let env = &env;
                let skin = Arc::clone(&skin);
                scope.spawn(move || {
                    let ctx = context(json!({"xs": [i, i + 1]}));
                    (i, env.render(&skin, &ctx).unwrap())
                })
            })
            .collect();

        for handle in handles {
            let (i, output) = handle.join().unwrap();
            assert_eq!(output, format!("{}-{}", i, i + 1));
        }
    });
}

#[test]
fn test_yaml_context() {
    let ctx = SkinContext::from_yaml("site:\n  title: Docs\ntags: [a, b]\n").unwrap();
    assert_eq!(
        render("<% site.title %>: <% tags | join ', ' %>", &ctx),
        "Docs: a, b"
    );
}
