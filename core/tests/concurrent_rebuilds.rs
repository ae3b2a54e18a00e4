use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use media_route_core::in_memory::{InMemoryCollaborator, InMemoryPeerCache};
use media_route_core::{
    Capabilities, DiscoveryEvent, EngineConfig, EngineEvent, Route, RouteEngine, RouteType,
    RoutingSession,
};

const APP: &str = "com.example.player";

fn session(selectable: &[&str]) -> RoutingSession {
    RoutingSession::new("system", true)
        .with_selected(["speaker"])
        .with_selectable(selectable.iter().copied())
}

#[test]
fn readers_only_see_complete_lists() {
    let collaborator = Arc::new(InMemoryCollaborator::new(
        Capabilities::all(),
        session(&["a1", "a2", "a3"]),
    ));
    collaborator.add_package(APP);
    collaborator.set_routes(vec![
        Route::new("speaker", "Speaker", RouteType::BuiltinSpeaker).system(),
        Route::new("a1", "A1", RouteType::RemoteSpeaker),
        Route::new("a2", "A2", RouteType::RemoteSpeaker),
        Route::new("a3", "A3", RouteType::RemoteSpeaker),
        Route::new("b1", "B1", RouteType::RemoteTv),
        Route::new("b2", "B2", RouteType::RemoteTv),
    ]);
    let engine = Arc::new(
        RouteEngine::new(
            EngineConfig::new().with_app_id(APP),
            collaborator.clone(),
            Arc::new(InMemoryPeerCache::new()),
        )
        .unwrap(),
    );
    engine.start_scan().unwrap();

    let list_a = vec!["speaker", "a1", "a2", "a3"];
    let list_b = vec!["speaker", "b1", "b2"];
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            let done = done.clone();
            let (list_a, list_b) = (list_a.clone(), list_b.clone());
            thread::spawn(move || {
                let mut last_generation = 0;
                while !done.load(Ordering::SeqCst) {
                    let snapshot = engine.snapshot();
                    let ids: Vec<&str> =
                        snapshot.devices.devices().iter().map(|d| d.id.as_str()).collect();
                    assert!(ids == list_a || ids == list_b, "partial list observed: {:?}", ids);
                    let connected = snapshot.devices.connected().map(|d| d.id.as_str());
                    assert_eq!(connected, Some("speaker"));
                    assert!(snapshot.generation >= last_generation);
                    last_generation = snapshot.generation;
                }
            })
        })
        .collect();

    let writers: Vec<_> = (0..2)
        .map(|w| {
            let engine = engine.clone();
            let collaborator = collaborator.clone();
            thread::spawn(move || {
                for i in 0..200 {
                    if (i + w) % 2 == 0 {
                        collaborator.set_system_session(session(&["a1", "a2", "a3"]));
                    } else {
                        collaborator.set_system_session(session(&["b1", "b2"]));
                    }
                    engine.on_discovery_event(DiscoveryEvent::SessionsChanged).unwrap();
                }
            })
        })
        .collect();

    for writer in writers {
        writer.join().unwrap();
    }
    done.store(true, Ordering::SeqCst);
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(engine.snapshot().generation, 401);
}

#[test]
fn every_rebuild_emits_one_list_update() {
    let collaborator = Arc::new(InMemoryCollaborator::new(Capabilities::all(), session(&[])));
    collaborator.add_package(APP);
    collaborator.set_routes(vec![
        Route::new("speaker", "Speaker", RouteType::BuiltinSpeaker).system(),
    ]);
    let engine = Arc::new(
        RouteEngine::new(
            EngineConfig::new().with_app_id(APP).with_event_capacity(1024),
            collaborator,
            Arc::new(InMemoryPeerCache::new()),
        )
        .unwrap(),
    );
    let mut rx = engine.subscribe();
    engine.start_scan().unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    engine.on_discovery_event(DiscoveryEvent::RoutesChanged).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut generations = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let EngineEvent::DeviceListUpdated(snapshot) = event {
            generations.push(snapshot.generation);
        }
    }
    assert_eq!(generations, (1..=201).collect::<Vec<_>>());
}
