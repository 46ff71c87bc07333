//! Command queue behaviour under concurrency, failure and shutdown.

mod common;

use common::EventRecorder;
use lift_dispatch::{
    CommandQueue, Direction, DispatchCommand, DispatchConfig, DispatchError, DispatchOutcome,
    DispatchService, ElevatorId, ElevatorRegistry, ElevatorSnapshot, ElevatorSystem, EventBus,
    EventKind, PendingHallCalls, QueueConfig, SchedulerStrategy, StrategyKind,
};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

struct Fixture {
    bus: Arc<EventBus>,
    registry: Arc<ElevatorRegistry>,
    service: Arc<DispatchService>,
}

fn fixture(units: usize, strategy: StrategyKind) -> Fixture {
    let bus = Arc::new(EventBus::new());
    let registry = Arc::new(ElevatorRegistry::new(&vec![0; units], Arc::clone(&bus)));
    let pending = PendingHallCalls::attach(Arc::clone(&registry), &bus, "pending");
    let service = Arc::new(DispatchService::new(
        Arc::clone(&bus),
        Arc::clone(&registry),
        pending,
        strategy.build(),
    ));
    Fixture {
        bus,
        registry,
        service,
    }
}

fn queue_config(capacity: usize, worker_count: usize) -> QueueConfig {
    QueueConfig {
        capacity,
        worker_count,
        ..QueueConfig::default()
    }
}

#[test]
fn test_concurrent_submissions_all_execute() {
    let fx = fixture(3, StrategyKind::ExclusiveEta);
    let recorder = EventRecorder::attach(&fx.bus);
    let queue = Arc::new(CommandQueue::start(&queue_config(8, 4), Arc::clone(&fx.service)).unwrap());

    let threads: Vec<_> = (0..8)
        .map(|t| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                (0..25)
                    .map(|i| {
                        let floor = (t * 25 + i) % 40;
                        queue
                            .submit(DispatchCommand::hall_call(floor, Direction::Up))
                            .unwrap()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut outcomes = Vec::new();
    for handle in threads {
        for ticket in handle.join().unwrap() {
            outcomes.push(ticket.wait().unwrap());
        }
    }

    assert_eq!(outcomes.len(), 200);
    assert!(outcomes.iter().all(|o| o.assigned_units().len() == 1));
    assert_eq!(recorder.count(EventKind::HallCallRaised), 200);
    assert_eq!(recorder.count(EventKind::AssignmentMade), 200);

    let stats = queue.stats();
    assert_eq!(stats.submitted, 200);
    assert_eq!(stats.completed, 200);
    assert_eq!(stats.failed, 0);
    queue.shutdown();
}

#[test]
fn test_concurrent_broadcasts_with_running_driver() {
    let mut config = DispatchConfig::with_uniform_fleet(3, 0)
        .with_strategy(StrategyKind::Broadcast)
        .with_workers(4);
    config.driver.step_interval_ms = 1;
    let system = ElevatorSystem::new(&config).unwrap();
    let recorder = EventRecorder::attach(system.event_bus());
    system.start_driver().unwrap();

    thread::scope(|scope| {
        let submitters: Vec<_> = (0..4)
            .map(|t| {
                let system = &system;
                scope.spawn(move || {
                    (1..=5)
                        .map(|i| {
                            system
                                .request_elevator(t * 5 + i, Direction::Up)
                                .unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for handle in submitters {
            for ticket in handle.join().unwrap() {
                assert!(!ticket.wait().unwrap().is_dropped());
            }
        }
    });

    let deadline = Instant::now() + Duration::from_secs(10);
    let settled = |system: &ElevatorSystem| {
        system.pending().is_empty() && system.status().iter().all(|s| s.queued_stops() == 0)
    };
    while !settled(&system) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    system.shutdown();

    for floor in 1..=20 {
        assert_eq!(
            recorder.served_by(floor, Direction::Up).len(),
            1,
            "floor {floor} should be served exactly once"
        );
    }
    assert!(system.pending().is_empty());
    for snapshot in system.status() {
        assert_eq!(snapshot.queued_stops(), 0, "leftover stops on {snapshot}");
        assert!(snapshot.is_idle());
    }
}

#[test]
fn test_single_worker_preserves_submission_order() {
    let fx = fixture(1, StrategyKind::Broadcast);
    let recorder = EventRecorder::attach(&fx.bus);
    let queue = CommandQueue::start(&queue_config(16, 1), Arc::clone(&fx.service)).unwrap();

    let tickets: Vec<_> = [5, 2, 9, 4]
        .iter()
        .map(|&floor| {
            queue
                .submit(DispatchCommand::hall_call(floor, Direction::Down))
                .unwrap()
        })
        .collect();
    for ticket in tickets {
        ticket.wait().unwrap();
    }

    let raised: Vec<i32> = recorder
        .of_kind(EventKind::HallCallRaised)
        .into_iter()
        .filter_map(|e| match e {
            lift_dispatch::DomainEvent::HallCallRaised { floor, .. } => Some(floor),
            _ => None,
        })
        .collect();
    assert_eq!(raised, vec![5, 2, 9, 4]);
}

#[test]
fn test_failed_command_does_not_stop_worker() {
    let fx = fixture(2, StrategyKind::Broadcast);
    let queue = CommandQueue::start(&queue_config(4, 1), Arc::clone(&fx.service)).unwrap();

    let bad = queue.submit(DispatchCommand::car_call(42, 3)).unwrap();
    let idle = queue
        .submit(DispatchCommand::hall_call(3, Direction::Idle))
        .unwrap();
    let good = queue.submit(DispatchCommand::car_call(2, 3)).unwrap();

    assert_eq!(bad.wait(), Err(DispatchError::UnknownElevator { unit_id: 42 }));
    assert!(matches!(
        idle.wait(),
        Err(DispatchError::InvalidDirection { .. })
    ));
    assert_eq!(good.wait(), Ok(DispatchOutcome::CabinQueued { unit_id: 2 }));
    assert!(fx.registry.get(2).unwrap().has_stop(3, Direction::Idle));

    let stats = queue.stats();
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.completed, 1);
}

#[test]
fn test_subscriber_panic_does_not_fail_command() {
    let fx = fixture(1, StrategyKind::Broadcast);
    fx.bus
        .subscribe_fn("explodes", &[EventKind::HallCallRaised], |_| {
            panic!("subscriber panic")
        });
    let queue = CommandQueue::start(&queue_config(4, 1), Arc::clone(&fx.service)).unwrap();

    // Subscriber panics are contained by the bus, so the command itself succeeds
    let outcome = queue
        .submit(DispatchCommand::hall_call(2, Direction::Up))
        .unwrap()
        .wait()
        .unwrap();
    assert_eq!(outcome.assigned_units(), &[1]);
    assert_eq!(fx.bus.stats().handler_failures, 1);
}

#[derive(Debug)]
struct PanickingStrategy;

impl SchedulerStrategy for PanickingStrategy {
    fn select(&self, _floor: i32, _direction: Direction, _snapshots: &[ElevatorSnapshot]) -> Vec<ElevatorId> {
        panic!("scheduler exploded")
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::ExclusiveEta
    }
}

#[test]
fn test_panicking_command_is_reported_on_ticket() {
    let fx = fixture(1, StrategyKind::Broadcast);
    fx.service.set_strategy(Arc::new(PanickingStrategy));
    let queue = CommandQueue::start(&queue_config(4, 1), Arc::clone(&fx.service)).unwrap();

    let result = queue
        .submit(DispatchCommand::hall_call(2, Direction::Up))
        .unwrap()
        .wait();
    match result {
        Err(DispatchError::CommandPanicked { command, reason }) => {
            assert_eq!(command, "hall_call(2, up)");
            assert!(reason.contains("scheduler exploded"));
        }
        other => panic!("expected CommandPanicked, got {other:?}"),
    }

    // The worker survives and keeps serving
    let outcome = queue
        .submit(DispatchCommand::car_call(1, 4))
        .unwrap()
        .wait()
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::CabinQueued { unit_id: 1 });
    assert_eq!(queue.stats().failed, 1);
}

#[test]
fn test_try_submit_reports_full_queue() {
    let fx = fixture(1, StrategyKind::Broadcast);
    // Block the only worker inside a subscriber until released
    let (release_tx, release_rx) = crossbeam::channel::bounded::<()>(0);
    let (entered_tx, entered_rx) = crossbeam::channel::bounded::<()>(1);
    fx.bus
        .subscribe_fn("gate", &[EventKind::HallCallRaised], move |_| {
            let _ = entered_tx.try_send(());
            let _ = release_rx.recv_timeout(Duration::from_secs(5));
            Ok(())
        });
    let queue = CommandQueue::start(&queue_config(1, 1), Arc::clone(&fx.service)).unwrap();

    let first = queue
        .try_submit(DispatchCommand::hall_call(1, Direction::Up))
        .unwrap();
    entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    let second = queue
        .try_submit(DispatchCommand::hall_call(2, Direction::Up))
        .unwrap();
    assert_eq!(
        queue
            .try_submit(DispatchCommand::hall_call(3, Direction::Up))
            .unwrap_err(),
        DispatchError::QueueFull { capacity: 1 }
    );

    release_tx.send(()).unwrap();
    release_tx.send(()).unwrap();
    assert!(first.wait().is_ok());
    assert!(second.wait().is_ok());
}

#[test]
fn test_shutdown_is_idempotent_and_rejects_new_commands() {
    let fx = fixture(1, StrategyKind::Broadcast);
    let queue = CommandQueue::start(&queue_config(4, 2), Arc::clone(&fx.service)).unwrap();

    let ticket = queue.submit(DispatchCommand::car_call(1, 4)).unwrap();
    assert!(ticket.wait().is_ok());

    queue.shutdown();
    queue.shutdown();
    assert!(queue.is_shutdown());

    assert_eq!(
        queue.submit(DispatchCommand::car_call(1, 5)).unwrap_err(),
        DispatchError::QueueShutdown
    );
    assert_eq!(
        queue.try_submit(DispatchCommand::car_call(1, 5)).unwrap_err(),
        DispatchError::QueueShutdown
    );
}

#[test]
fn test_shutdown_abandons_queued_commands() {
    let fx = fixture(1, StrategyKind::Broadcast);
    let (release_tx, release_rx) = crossbeam::channel::bounded::<()>(0);
    let (entered_tx, entered_rx) = crossbeam::channel::bounded::<()>(1);
    fx.bus
        .subscribe_fn("gate", &[EventKind::HallCallRaised], move |_| {
            let _ = entered_tx.try_send(());
            let _ = release_rx.recv_timeout(Duration::from_secs(5));
            Ok(())
        });
    let queue = Arc::new(CommandQueue::start(&queue_config(4, 1), Arc::clone(&fx.service)).unwrap());

    let running = queue
        .submit(DispatchCommand::hall_call(1, Direction::Up))
        .unwrap();
    entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    let waiting = queue.submit(DispatchCommand::car_call(1, 6)).unwrap();

    let stopper = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.shutdown())
    };
    // Let shutdown flip the flag before the in-flight command finishes
    thread::sleep(Duration::from_millis(50));
    release_tx.send(()).unwrap();
    stopper.join().unwrap();

    assert!(running.wait().is_ok());
    assert_eq!(waiting.wait(), Err(DispatchError::QueueShutdown));
    assert_eq!(queue.stats().abandoned, 1);
    assert!(!fx.registry.get(1).unwrap().has_stop(6, Direction::Idle));
}

#[test]
fn test_submissions_racing_shutdown_always_resolve() {
    for _ in 0..50 {
        let fx = fixture(1, StrategyKind::Broadcast);
        let queue = Arc::new(CommandQueue::start(&queue_config(64, 2), Arc::clone(&fx.service)).unwrap());

        let submitters: Vec<_> = (0..4)
            .map(|t| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    (0..20)
                        .filter_map(|i| {
                            queue
                                .submit(DispatchCommand::hall_call(t * 20 + i, Direction::Up))
                                .ok()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        queue.shutdown();

        for handle in submitters {
            for ticket in handle.join().unwrap() {
                let resolved = ticket.wait_timeout(Duration::from_secs(5));
                assert!(
                    matches!(resolved, Some(Ok(_)) | Some(Err(DispatchError::QueueShutdown))),
                    "accepted command never resolved: {resolved:?}"
                );
            }
        }

        let stats = queue.stats();
        assert_eq!(stats.submitted, stats.completed + stats.failed + stats.abandoned);
        assert_eq!(stats.queued, 0);
    }
}

#[test]
fn test_rejects_zero_workers() {
    let fx = fixture(1, StrategyKind::Broadcast);
    let err = CommandQueue::start(&queue_config(4, 0), fx.service).unwrap_err();
    assert!(matches!(err, DispatchError::ConfigurationError(_)));
}
