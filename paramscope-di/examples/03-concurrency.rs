// note: this example assumes you've analyzed the previous ones

use paramscope_di::config::ScopeConfig;
use paramscope_di::instance_provider::ComponentInstancePtr;
use paramscope_di::scoped_factory::{Parameters, ScopedFactory};
use paramscope_di::Component;
use std::sync::Arc;
use std::thread;

#[derive(Component)]
#[component(scope = "PARAMETER")]
struct WorkerId(#[component(default)] usize);

#[derive(Component)]
struct Counter;

#[derive(Component)]
#[component(scope = "PROTOTYPE")]
struct Job {
    worker_id: ComponentInstancePtr<WorkerId>,
    counter: ComponentInstancePtr<Counter>,
}

fn main() {
    // overrides are confined to the thread performing the call, so a single factory can be shared
    // by any number of threads
    let factory = ScopedFactory::from_config(&ScopeConfig::default())
        .expect("error creating ScopedFactory");

    let jobs: Vec<_> = (0..16)
        .map(|worker_id| {
            let factory = factory.clone();
            thread::spawn(move || {
                factory
                    .create::<Job>(Parameters::new().with(WorkerId(worker_id)))
                    .expect("error creating Job")
            })
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| handle.join().expect("worker panicked"))
        .collect();

    for (worker_id, job) in jobs.iter().enumerate() {
        // each job received its own parameter...
        assert_eq!(job.worker_id.0, worker_id);
        // ...but singletons are shared
        assert!(Arc::ptr_eq(&job.counter, &jobs[0].counter));
    }

    println!("Created {} jobs sharing a single Counter.", jobs.len());
}
