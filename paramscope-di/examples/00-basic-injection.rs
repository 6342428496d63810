use paramscope_di::factory::ComponentFactoryBuilder;
use paramscope_di::instance_provider::{ComponentInstancePtr, TypedComponentInstanceProvider};
use paramscope_di::{component_alias, injectable, Component};

// this is a trait we would like to use in our component
#[injectable]
trait Greeter {
    fn greet(&self);
}

// this is a dependency which implements the above trait and also is an injectable component
#[derive(Component)]
struct EnglishGreeter;

// we're telling the container to provide EnglishGreeter when asked for dyn Greeter
#[component_alias]
impl Greeter for EnglishGreeter {
    fn greet(&self) {
        println!("Hello world!");
    }
}

// this is another component, but with a dependency
#[derive(Component)]
struct Reception {
    // the container will know how to inject dyn Greeter, when asked for Reception
    greeter: ComponentInstancePtr<dyn Greeter + Send + Sync>,
}

impl Reception {
    fn welcome(&self) {
        self.greeter.greet();
    }
}

//noinspection DuplicatedCode
// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    // components are created by a ComponentFactory
    // for convenience, ComponentFactoryBuilder can be used to create the factory with a reasonable
    // default configuration
    let mut component_factory = ComponentFactoryBuilder::new()
        .expect("error initializing ComponentFactoryBuilder")
        .build()
        .expect("invalid container configuration");

    let reception = component_factory
        .primary_instance_typed::<Reception>()
        .expect("error creating Reception");

    // prints "Hello world!"
    reception.welcome();
}
