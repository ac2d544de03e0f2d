//! Binary for fetching model artifacts from the command line

use std::env;
use std::sync::Arc;
use visor_core::{VisionConfig, VisionError};
use visor_vision::models::ModelManager;

#[tokio::main]
async fn main() -> Result<(), VisionError> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: fetch_models <model_name>");
        eprintln!("Available models: face, hand, all");
        std::process::exit(1);
    }

    let model_name = args[1].to_lowercase();
    let config = VisionConfig::default();
    let manager = ModelManager::new(Arc::new(config));

    match model_name.as_str() {
        "face" => {
            println!("Fetching face detection model...");
            let path = manager.get_face_model().await?;
            println!("Face detection model saved to: {:?}", path);
        }
        "hand" => {
            println!("Fetching hand landmark model...");
            let path = manager.get_hand_landmark_model().await?;
            println!("Hand landmark model saved to: {:?}", path);
        }
        "all" => {
            println!("Fetching face detection model...");
            let path = manager.get_face_model().await?;
            println!("Face detection model saved to: {:?}", path);
            println!("Fetching hand landmark model...");
            let path = manager.get_hand_landmark_model().await?;
            println!("Hand landmark model saved to: {:?}", path);
        }
        _ => {
            eprintln!("Unknown model: {}", model_name);
            eprintln!("Available models: face, hand, all");
            std::process::exit(1);
        }
    }

    match manager.locate_emotion_model() {
        Some(path) => println!("Emotion network present at: {:?}", path),
        None => println!(
            "No emotion network found; place a trained emotion_cnn_best.onnx in the model directory"
        ),
    }

    Ok(())
}
