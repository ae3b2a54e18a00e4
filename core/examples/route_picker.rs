// Example wiring an in-memory discovery service to the route engine and printing device lists
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use log::info;
use media_route_core::in_memory::{InMemoryCollaborator, InMemoryPeerCache};
use media_route_core::{
    run_discovery_watch, run_engine_listener, BluetoothPeer, Capabilities, Device, DeviceSnapshot,
    EngineConfig, EngineEventListener, ListingPreference, PreferenceItem, Route, RouteEngine,
    RouteType, RoutingSession, ServiceGroup, VolumeHandling,
};

struct PrintingListener;

#[async_trait]
impl EngineEventListener for PrintingListener {
    async fn on_device_list_updated(&self, snapshot: Arc<DeviceSnapshot>) {
        println!("Device list #{}:", snapshot.generation);
        for device in snapshot.devices.devices() {
            println!(
                "  {} {:<20} {:?}{}",
                if device.is_selected() { "*" } else { " " },
                device.name,
                device.category,
                if device.is_suggested() { " (suggested)" } else { "" }
            );
        }
    }

    async fn on_connected_device_changed(&self, device: Option<Device>) {
        match device {
            Some(device) => println!("Connected to {}", device.name),
            None => println!("Not connected"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let app_id = "com.example.player";

    let system = RoutingSession::new("system", true)
        .with_name("Phone")
        .with_selected(["speaker"])
        .with_volume(7, 15, VolumeHandling::Variable);
    let discovery = Arc::new(InMemoryCollaborator::new(Capabilities::all(), system));
    discovery.add_package(app_id);
    discovery.set_routes(vec![
        Route::new("speaker", "Phone speaker", RouteType::BuiltinSpeaker).system(),
        Route::new("buds", "Headphones", RouteType::BluetoothA2dp)
            .system()
            .with_address("00:11:22:33:44:55"),
        Route::new("tv", "Living room TV", RouteType::RemoteTv)
            .with_deduplication_ids(["cast-tv"]),
        Route::new("tv-dial", "Living room TV", RouteType::RemoteTv)
            .with_deduplication_ids(["cast-tv"]),
        Route::new("avr", "Receiver", RouteType::RemoteAudioVideoReceiver),
    ]);
    discovery.set_transferable(app_id, ["buds", "tv", "tv-dial", "avr"]);

    let peers = Arc::new(InMemoryPeerCache::new());
    peers.insert(BluetoothPeer {
        address: "00:11:22:33:44:55".to_string(),
        name: "Running buds".to_string(),
    });

    let engine = Arc::new(RouteEngine::new(
        EngineConfig::new().with_app_id(app_id),
        discovery.clone(),
        peers,
    )?);

    let mut services = ServiceGroup::new();
    services.add(run_engine_listener(engine.subscribe(), Arc::new(PrintingListener)));
    services.add(run_discovery_watch(engine.clone(), discovery.subscribe()));

    engine.start_scan()?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    info!("Publishing listing preference");
    discovery.set_listing_preference(Some(ListingPreference::new(vec![
        PreferenceItem::new("tv"),
        PreferenceItem::suggested("avr"),
    ])));
    tokio::time::sleep(Duration::from_millis(100)).await;

    info!("Casting to the TV");
    discovery.add_remote_session(
        app_id,
        RoutingSession::new("cast", false)
            .with_name("Living room")
            .with_selected(["tv"])
            .with_deselectable(["tv"])
            .with_volume(3, 10, VolumeHandling::Variable),
    );
    tokio::time::sleep(Duration::from_millis(100)).await;
    println!(
        "Session {} volume {}/{}",
        engine.session_name()?,
        engine.session_volume()?,
        engine.session_volume_max()?
    );

    engine.stop_scan();
    services.stop().await?;
    Ok(())
}
