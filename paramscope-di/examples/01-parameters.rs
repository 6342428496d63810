// note: this example assumes you've analyzed the previous one

use paramscope_di::config::ScopeConfig;
use paramscope_di::instance_provider::ComponentInstancePtr;
use paramscope_di::scoped_factory::{Parameters, ScopedFactory};
use paramscope_di::Component;
use tracing_subscriber::EnvFilter;

// parameters are components living in the "PARAMETER" scope - their instances are not created by
// the container, but supplied by whoever calls ScopedFactory::create
#[derive(Component)]
#[component(scope = "PARAMETER")]
struct UserName(#[component(default)] String);

#[derive(Component)]
#[component(scope = "PARAMETER")]
struct RequestId(#[component(default)] u64);

// a regular singleton, shared by everything created by the factory
#[derive(Component)]
struct Templates;

impl Templates {
    fn greeting(&self, name: &str) -> String {
        format!("Hello {name}!")
    }
}

// the component we want to create with different parameters
#[derive(Component)]
#[component(scope = "PROTOTYPE")]
struct RequestHandler {
    user_name: ComponentInstancePtr<UserName>,
    request_id: ComponentInstancePtr<RequestId>,
    templates: ComponentInstancePtr<Templates>,
}

impl RequestHandler {
    fn handle(&self) {
        println!(
            "[{}] {}",
            self.request_id.0,
            self.templates.greeting(&self.user_name.0)
        );
    }
}

//noinspection DuplicatedCode
fn main() {
    // run with RUST_LOG=trace to see how overrides are applied and removed
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // the default configuration registers the "PARAMETER" scope with the stack cleanup policy and
    // no fallback for missing parameters
    let factory = ScopedFactory::from_config(&ScopeConfig::default())
        .expect("error creating ScopedFactory");

    for (request_id, user_name) in [(1, "Alice"), (2, "Bob")] {
        // parameter order doesn't matter - each one is identified by its type
        let handler = factory
            .create::<RequestHandler>(
                Parameters::new()
                    .with(UserName(user_name.to_string()))
                    .with(RequestId(request_id)),
            )
            .expect("error creating RequestHandler");

        // prints "[1] Hello Alice!" and "[2] Hello Bob!"
        handler.handle();
    }

    // without parameters, creation fails with a MissingOverride error
    if let Err(error) = factory.create_default::<RequestHandler>() {
        println!("{error}");
    }
}
