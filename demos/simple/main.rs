use rox::{ClientConfig, Container, Context, Flag, ImpressionArgs, Variant};

pub fn main() -> rox::Result<()> {
    // Configure env_logger to see Rox logs.
    env_logger::Builder::from_env(env_logger::Env::new().default_filter_or("rox")).init();

    let client = ClientConfig::new()
        .context(Context::new().with("app_version", "2.1.0"))
        .impression_handler(|args: &ImpressionArgs| {
            println!(
                "Impression: {} = {} (experiment: {:?})",
                args.reporting_value.name,
                args.reporting_value.value,
                args.experiment.as_ref().map(|e| &e.name)
            );
        })
        .to_client();

    client.set_custom_computed_string_property("app_version", |context: &Context| {
        context.get("app_version").as_str().map(str::to_owned)
    });
    client.set_custom_computed_string_property("email", |context: &Context| {
        context.get("email").as_str().map(str::to_owned)
    });

    let new_flow = Flag::new(false);
    let title_color = Variant::new("red", ["green", "blue"]);
    client.register(Container::new("checkout").flag("new_flow", &new_flow))?;
    client.register(Container::new("ui").variant("title_color", &title_color))?;

    // Normally delivered by a configuration source.
    client.apply_configuration(include_str!("../../tests/data/configuration.json"))?;

    new_flow.enabled(None, || println!("New checkout flow is enabled"));

    let staff = Context::new().with("email", "ops@example.com");
    let color = title_color.get_value(Some(&staff));
    println!("Title color: {} (default: {})", color.value, color.is_default);

    Ok(())
}
