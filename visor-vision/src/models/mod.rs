//! Model artifacts: acquisition, caching, and inference sessions

pub mod emotion_net;
pub mod hand_net;
pub mod manager;

pub use emotion_net::EmotionNet;
pub use hand_net::HandNet;
pub use manager::ModelManager;
