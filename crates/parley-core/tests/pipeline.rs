//! End-to-end behaviour of the hear → mention pipeline.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use parley_core::prelude::*;
use parley_core::{Filter, SubscriptionId};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn log() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

#[test]
fn once_handler_fires_exactly_once() {
    init_logging();
    let robot = Robot::new("Robot");
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);

    robot
        .once("event", "ping", move |_ctx| {
            h.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    robot.emit("event", "ping", Fields::new());
    robot.emit("event", "ping", Fields::new());

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(robot.subscription_count("event"), 0);
}

#[test]
fn every_matching_handler_runs_in_registration_order() {
    let robot = Robot::new("Robot");
    let order = log();

    for i in 0..5 {
        let order = Arc::clone(&order);
        robot
            .on(EventKind::Hear, r"\w+", move |_ctx| order.lock().push(i.to_string()))
            .unwrap();
    }

    robot.hear("anything", Fields::new());
    assert_eq!(*order.lock(), vec!["0", "1", "2", "3", "4"]);
}

#[test]
fn self_unregister_does_not_disturb_the_pass() {
    let robot = Robot::new("Robot");
    let order = log();
    let own_id: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));

    let o = Arc::clone(&order);
    robot.on_any(EventKind::Hear, move |_ctx| o.lock().push("before".into()));

    let o = Arc::clone(&order);
    let slot = Arc::clone(&own_id);
    let id = robot.on_any(EventKind::Hear, move |ctx| {
        o.lock().push("self".into());
        if let Some(id) = *slot.lock() {
            ctx.robot().off(id);
        }
    });
    *own_id.lock() = Some(id);

    let o = Arc::clone(&order);
    robot.on_any(EventKind::Hear, move |_ctx| o.lock().push("after".into()));

    robot.hear("one", Fields::new());
    robot.hear("two", Fields::new());

    assert_eq!(
        *order.lock(),
        vec!["before", "self", "after", "before", "after"]
    );
    assert!(!robot.off(id));
}

#[test]
fn removing_a_later_subscription_takes_effect_next_message() {
    let robot = Robot::new("Robot");
    let order = log();
    let victim: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));

    let o = Arc::clone(&order);
    let slot = Arc::clone(&victim);
    robot.on_any(EventKind::Hear, move |ctx| {
        o.lock().push("a".into());
        if let Some(id) = slot.lock().take() {
            assert!(ctx.robot().off(id));
        }
    });

    let o = Arc::clone(&order);
    let b = robot.on_any(EventKind::Hear, move |_ctx| o.lock().push("b".into()));
    *victim.lock() = Some(b);

    robot.hear("one", Fields::new());
    robot.hear("two", Fields::new());

    assert_eq!(*order.lock(), vec!["a", "b", "a"]);
    assert_eq!(robot.subscription_count(EventKind::Hear), 1);
}

#[test]
fn subscription_added_during_dispatch_waits_for_next_message() {
    let robot = Robot::new("Robot");
    let late = Arc::new(AtomicUsize::new(0));

    let l = Arc::clone(&late);
    robot
        .once(EventKind::Hear, "arm", move |ctx| {
            let l = Arc::clone(&l);
            ctx.robot().on_any(EventKind::Hear, move |_ctx| {
                l.fetch_add(1, Ordering::SeqCst);
            });
        })
        .unwrap();

    robot.hear("arm", Fields::new());
    assert_eq!(late.load(Ordering::SeqCst), 0);

    robot.hear("fire", Fields::new());
    assert_eq!(late.load(Ordering::SeqCst), 1);
}

#[test]
fn reentrant_hear_is_an_independent_pass() {
    let robot = Robot::new("Robot");
    let heard = log();

    let h = Arc::clone(&heard);
    robot.on_any(EventKind::Hear, move |ctx| {
        h.lock().push(ctx.message().to_string());
    });
    robot
        .once(EventKind::Hear, "^echo (.+)$", |ctx| {
            let inner = ctx.capture(1).unwrap_or_default().to_string();
            ctx.robot().hear(&inner, Fields::new());
        })
        .unwrap();

    robot.hear("echo hi", Fields::new());
    assert_eq!(*heard.lock(), vec!["echo hi", "hi"]);
}

#[test]
fn once_is_not_refired_by_reentrant_dispatch() {
    let robot = Robot::new("Robot");
    let hits = Arc::new(AtomicUsize::new(0));

    let h = Arc::clone(&hits);
    robot
        .once(EventKind::Hear, "loop", move |ctx| {
            h.fetch_add(1, Ordering::SeqCst);
            ctx.robot().hear("loop again", Fields::new());
        })
        .unwrap();

    robot.hear("loop", Fields::new());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn mention_scenario_with_string_filter() {
    let robot = Robot::new("Robot");
    assert_eq!(robot.mention_prefix(None), "@Robot ");

    let seen = Arc::new(Mutex::new(None));
    let s = Arc::clone(&seen);
    robot
        .on(EventKind::Mention, "help", move |ctx| {
            *s.lock() = Some((ctx.capture(0).map(str::to_string), ctx.message().to_string()));
        })
        .unwrap();

    assert!(robot.is_mentioned("@Robot help"));
    robot.hear("@Robot help", Fields::new());

    assert_eq!(
        seen.lock().clone(),
        Some((Some("help".to_string()), "@Robot help".to_string()))
    );
}

#[test]
fn combined_filter_fires_on_one_of_four_combinations() {
    let robot = Robot::new("Robot");
    let hits = log();

    let h = Arc::clone(&hits);
    let filter = Filter::regex("yes")
        .unwrap()
        .with_attrs(AttrFilter::new().eq("user", "yes"));
    robot
        .on("event", filter, move |ctx| {
            h.lock()
                .push(format!("{}/{}", ctx.message(), ctx.user().unwrap_or_default()));
        })
        .unwrap();

    for text in ["no", "yes"] {
        for user in ["no", "yes"] {
            robot.emit("event", text, fields([("user", user)]));
        }
    }

    assert_eq!(*hits.lock(), vec!["yes/yes"]);
}

#[test]
fn context_mutations_flow_to_later_handlers_and_mention_pass() {
    let robot = Robot::new("Robot");
    let seen = Arc::new(Mutex::new(None));

    robot.on_any(EventKind::Hear, |ctx| {
        ctx.set("tagged", true);
    });
    let s = Arc::clone(&seen);
    robot.on_any(EventKind::Mention, move |ctx| {
        *s.lock() = ctx.get("tagged").cloned();
    });

    robot.hear("Robot: status", fields([("user", "alice")]));
    assert_eq!(seen.lock().clone(), Some(serde_json::Value::Bool(true)));
}

#[test]
fn plugins_can_replace_the_output_channel() {
    struct Upper(Arc<Mutex<Vec<String>>>);

    impl OutputChannel for Upper {
        fn say(&self, _robot: &Robot, text: &str, _fields: &Fields) -> HandlerResult {
            self.0.lock().push(text.to_uppercase());
            Ok(())
        }
    }

    let said = log();
    let sink = Arc::clone(&said);
    let robot = Robot::builder()
        .plugin(named("loud", move |robot: &Robot| {
            robot.set_output(Arc::new(Upper(Arc::clone(&sink))));
        }))
        .plugin(named("ping", |robot: &Robot| -> CoreResult<()> {
            robot.on(EventKind::Mention, r"\bping\b", |ctx| {
                ctx.robot().say("pong", ctx.fields())
            })?;
            Ok(())
        }))
        .build()
        .unwrap();

    robot.hear("robot ping", Fields::new());
    assert_eq!(*said.lock(), vec!["PONG"]);
}
