// Per-room message fan-out
//
// Each room code owns one broadcast channel; every real-time connection in
// the room holds a receiver and forwards what it hears to its socket.

// Public API - what other modules can use
pub use bus::EventBus;
pub use room_subscription::RoomSubscription;

// Internal modules
mod bus;
mod room_subscription;
