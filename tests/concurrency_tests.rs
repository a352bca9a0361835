use std::sync::{Arc, Barrier};
use std::thread;

use audio_context_manager::config::ContextConfig;
use audio_context_manager::error::ErrorKind;
use audio_context_manager::system::DriverCall;

mod test_utils;
use test_utils::EnvironmentBuilder;

#[test]
fn test_racing_constructors_open_exactly_one_context() {
    let env = EnvironmentBuilder::new().build();
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let manager = Arc::clone(&env.manager);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                manager.open_context(&ContextConfig::default())
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let opened = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(opened, 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| e.kind() == ErrorKind::Unsupported)
    );
    assert_eq!(env.driver.live_context_count(), 1);
}

#[test]
fn test_concurrent_make_current_keeps_one_current() {
    let env = EnvironmentBuilder::new()
        .devices(&["Speakers", "Headphones"])
        .shared()
        .build();
    let first = env
        .manager
        .open_context(&ContextConfig::default().with_device("Speakers"))
        .unwrap();
    let second = env
        .manager
        .open_context(&ContextConfig::default().with_device("Headphones"))
        .unwrap();
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = [first.clone(), second.clone()]
        .into_iter()
        .map(|context| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..200 {
                    context.make_current().unwrap();
                    let current = context.manager().current_context();
                    assert!(current.is_some());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let current_count = [&first, &second]
        .iter()
        .filter(|context| context.is_current().unwrap())
        .count();
    assert_eq!(current_count, 1);

    let current = env.manager.current_context().unwrap();
    assert!(current == first || current == second);
    assert_eq!(current.context_handle(), env.driver.current());

    let last_switched = env
        .driver
        .calls()
        .into_iter()
        .rev()
        .find_map(|call| match call {
            DriverCall::MakeCurrent(Some(handle)) => Some(handle),
            _ => None,
        });
    assert_eq!(current.context_handle(), last_switched);
}

#[test]
fn test_concurrent_dispose_releases_once() {
    let env = EnvironmentBuilder::new().build();
    let context = env.manager.open_context(&ContextConfig::default()).unwrap();
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let context = context.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                context.dispose();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(context.is_disposed());
    assert_eq!(env.close_calls(), 1);
    assert_eq!(env.destroy_calls(), 1);
    assert_eq!(env.driver.double_release_count(), 0);
}

#[test]
fn test_shared_mode_allows_multiple_contexts() {
    let env = EnvironmentBuilder::new()
        .devices(&["Speakers", "Headphones"])
        .shared()
        .build();

    let first = env.manager.open_context(&ContextConfig::default()).unwrap();
    let second = env
        .manager
        .open_context(&ContextConfig::default().with_device("Headphones"))
        .unwrap();

    assert_eq!(env.manager.context_count(), 2);
    assert!(second.is_current().unwrap());
    assert!(!first.is_current().unwrap());

    second.dispose();
    assert!(env.manager.context_exists());
    assert!(env.manager.current_context().is_none());

    first.make_current().unwrap();
    assert_eq!(env.manager.current_context(), Some(first.clone()));
}
