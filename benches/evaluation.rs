use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use rox::{roxx::Evaluator, ClientConfig, Container, Context, Flag};

fn criterion_benchmark(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("evaluate_expression");
        group.throughput(Throughput::Elements(1));
        let evaluator = Evaluator::default();
        let context = Context::new();
        for (name, expression) in [
            ("literal", "true"),
            ("nested", r#"ifThen(and(true, not(false)), "B", "A")"#),
            (
                "semver",
                r#"or(semverGte("2.1.0", "2.0.0"), semverLt("1.0.0-beta", "1.0.0"))"#,
            ),
            (
                "percentage",
                r#"isInPercentageRange(0.25, 0.75, concat("checkout.", "user-42"))"#,
            ),
        ] {
            group.bench_function(name, |b| {
                b.iter(|| evaluator.evaluate_expression(black_box(expression), black_box(&context)))
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("flag");
        group.throughput(Throughput::Elements(1));
        let client = ClientConfig::new()
            .context(Context::new().with("app_version", "2.3.0"))
            .to_client();
        client.set_custom_computed_string_property("app_version", |context: &Context| {
            context.get("app_version").as_str().map(str::to_owned)
        });
        let flag = Flag::new(false);
        client
            .register(Container::new("bench").flag("flag", &flag))
            .unwrap();
        client
            .apply_configuration(include_str!("../tests/data/configuration.json"))
            .unwrap();

        group.bench_function("is_enabled/unbound", |b| {
            b.iter(|| flag.is_enabled(black_box(None)))
        });
        let local = Context::new().with("email", "jane@example.com");
        group.bench_function("client/is_enabled", |b| {
            b.iter(|| client.is_enabled(black_box("checkout.new_flow"), false, Some(&local)))
        });
        group.finish();
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
