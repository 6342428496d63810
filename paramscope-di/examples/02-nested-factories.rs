// note: this example assumes you've analyzed the previous one

use paramscope_di::config::ScopeConfig;
use paramscope_di::instance_provider::{
    ComponentInstanceProvider, ComponentInstanceProviderError, ComponentInstancePtr,
};
use paramscope_di::scoped_factory::{Parameters, ScopedFactory};
use paramscope_di::Component;

#[derive(Component)]
#[component(scope = "PARAMETER")]
struct Depth(#[component(default)] u32);

#[derive(Component)]
#[component(scope = "PROTOTYPE", after_inject = "create_children")]
struct Node {
    depth: ComponentInstancePtr<Depth>,
    #[component(default)]
    children: Vec<ComponentInstancePtr<Node>>,
}

impl Node {
    // after_inject hooks run when all dependencies are injected - a good place to create other
    // components with different parameters
    fn create_children(
        &mut self,
        _instance_provider: &mut dyn ComponentInstanceProvider,
    ) -> Result<(), ComponentInstanceProviderError> {
        if self.depth.0 >= 2 {
            return Ok(());
        }

        // the factory currently creating this node is available to nested calls
        if let Some(factory) = ScopedFactory::current() {
            for _ in 0..2 {
                // nested parameters shadow the outer ones only for the duration of the call
                self.children.push(
                    factory.create::<Node>(Parameters::new().with(Depth(self.depth.0 + 1)))?,
                );
            }
        }

        Ok(())
    }

    fn print(&self) {
        println!("{}node at depth {}", "  ".repeat(self.depth.0 as usize), self.depth.0);
        for child in &self.children {
            child.print();
        }
    }
}

fn main() {
    let factory = ScopedFactory::from_config(&ScopeConfig::default())
        .expect("error creating ScopedFactory");

    let root = factory
        .create::<Node>(Parameters::new().with(Depth(0)))
        .expect("error creating Node");

    // prints a tree of depth 2 with 2 children per node
    root.print();
}
