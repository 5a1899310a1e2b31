use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    thread,
};

use rox::{Client, ClientConfig, Container, Context, Flag, ImpressionArgs, Variant};

const CONFIGURATION: &str = include_str!("data/configuration.json");

struct Flags {
    new_flow: Flag,
    title_color: Variant,
    banner: Flag,
    everyone: Flag,
}

fn init() -> (Client, Flags, Arc<Mutex<Vec<ImpressionArgs>>>, Arc<AtomicUsize>) {
    let _ = env_logger::builder().is_test(true).try_init();

    let impressions = Arc::new(Mutex::new(Vec::new()));
    let analytics = Arc::new(AtomicUsize::new(0));
    let client = {
        let impressions = impressions.clone();
        let analytics = analytics.clone();
        ClientConfig::new()
            .context(Context::new().with("app_version", "1.4.2"))
            .impression_handler(move |args: &ImpressionArgs| {
                impressions.lock().unwrap().push(args.clone());
            })
            .analytics(
                move |_: &ImpressionArgs| {
                    analytics.fetch_add(1, Ordering::SeqCst);
                },
                || true,
            )
            .to_client()
    };

    for name in ["app_version", "email", "user_id"] {
        client.set_custom_computed_string_property(name, move |context: &Context| {
            context.get(name).as_str().map(str::to_owned)
        });
    }

    let flags = Flags {
        new_flow: Flag::new(false),
        title_color: Variant::new("red", ["green", "blue"]),
        banner: Flag::new(false),
        everyone: Flag::new(false),
    };
    client
        .register(Container::new("checkout").flag("new_flow", &flags.new_flow))
        .unwrap();
    client
        .register(
            Container::new("ui")
                .variant("title_color", &flags.title_color)
                .flag("banner", &flags.banner),
        )
        .unwrap();
    client
        .register(Container::new("rollout").flag("everyone", &flags.everyone))
        .unwrap();

    client.apply_configuration(CONFIGURATION).unwrap();

    (client, flags, impressions, analytics)
}

#[test]
fn malformed_experiment_is_skipped() {
    let (client, _, _, _) = init();

    let mut names: Vec<_> = client.experiments().into_iter().map(|e| e.name).collect();
    names.sort();
    assert_eq!(
        names,
        [
            "full rollout",
            "new checkout",
            "old banner",
            "title color for staff"
        ]
    );
}

#[test]
fn local_context_shadows_global_context() {
    let (_, flags, _, _) = init();

    assert!(!flags.new_flow.is_enabled(None));

    let context = Context::new().with("app_version", "2.0.1");
    assert!(flags.new_flow.is_enabled(Some(&context)));

    let context = Context::new().with("app_version", "not a version");
    assert!(!flags.new_flow.is_enabled(Some(&context)));
}

#[test]
fn variant_follows_regex_targeting() {
    let (_, flags, _, _) = init();

    let staff = Context::new().with("email", "Jane@Example.com");
    let value = flags.title_color.get_value(Some(&staff));
    assert_eq!(value.value, "green");
    assert!(!value.is_default);

    let customer = Context::new().with("email", "jane@example.org");
    assert_eq!(flags.title_color.get_value(Some(&customer)).value, "blue");

    // `match` on an undefined email is false, not undefined.
    assert_eq!(flags.title_color.get_value(None).value, "blue");
}

#[test]
fn percentage_rollout() {
    let (client, flags, _, _) = init();

    let user = Context::new().with("user_id", "42");
    assert!(flags.everyone.is_enabled(Some(&user)));
    assert!(client.is_enabled("rollout.checkout", false, Some(&user)));

    // Without a user id the seed is undefined.
    assert!(!flags.everyone.is_enabled(None));
}

#[test]
fn impressions_and_analytics() {
    let (_, flags, impressions, analytics) = init();

    flags.banner.is_enabled(None);
    flags.new_flow.is_enabled(None);

    let impressions = impressions.lock().unwrap();
    assert_eq!(impressions.len(), 2);

    let banner = &impressions[0];
    assert_eq!(banner.reporting_value.name, "ui.banner");
    assert_eq!(banner.reporting_value.value, "true");
    let experiment = banner.experiment.as_ref().unwrap();
    assert!(experiment.is_archived);
    assert_eq!(experiment.labels, ["legacy"]);

    let new_flow = &impressions[1];
    assert_eq!(new_flow.reporting_value.value, "false");
    assert_eq!(
        new_flow.context.get("app_version"),
        rox::ExpressionValue::from("1.4.2")
    );

    // Archived experiments are not sent to analytics.
    assert_eq!(analytics.load(Ordering::SeqCst), 1);
}

#[test]
fn unregistered_flags_use_caller_defaults() {
    let (client, _, _, _) = init();

    assert!(client.is_enabled("missing.flag", true, None));
    assert!(!client.is_enabled("missing.flag", false, None));
    assert_eq!(
        client.value("missing.variant", "small", ["large"], None),
        "small"
    );
}

#[test]
fn refresh_while_evaluating() {
    let (client, flags, _, _) = init();
    let client = Arc::new(client);

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let title_color = flags.title_color.clone();
            thread::spawn(move || {
                let staff = Context::new().with("email", "ops@example.com");
                for _ in 0..1_000 {
                    let value = title_color.get_value(Some(&staff)).value;
                    assert!(value == "green" || value == "red", "unexpected {value}");
                }
            })
        })
        .collect();

    for i in 0..100 {
        if i % 2 == 0 {
            client.set_experiments(vec![]);
        } else {
            client.apply_configuration(CONFIGURATION).unwrap();
        }
    }

    for reader in readers {
        reader.join().unwrap();
    }
}
