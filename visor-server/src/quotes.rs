//! Display text attached to responses: motivational quotes keyed by emotion
//! and counting messages keyed by count. Pure lookup tables; the analyzers
//! never see these.

use rand::seq::SliceRandom;

const HAPPY: &[&str] = &[
    "Keep that beautiful smile! Your happiness is contagious! 😊",
    "Your joy brightens the world around you! ✨",
    "Happiness looks great on you! Stay positive! 🌟",
    "Your smile is your superpower! Keep shining! ☀️",
];

const SAD: &[&str] = &[
    "Every storm runs out of rain. This too shall pass. 🌈",
    "It's okay to feel sad. Tomorrow brings new hope. 💙",
    "Tough times don't last, but tough people do. You've got this! 💪",
    "Remember: after every sunset comes a sunrise. 🌅",
];

const ANGRY: &[&str] = &[
    "Take a deep breath. You're stronger than this moment. 🧘",
    "Channel your energy into something positive. You've got this! 💪",
    "Every setback is a setup for a comeback. Stay strong! 🔥",
    "Transform your frustration into motivation. You're capable of greatness! ⚡",
];

const SURPRISE: &[&str] = &[
    "Life is full of wonderful surprises! Embrace them! 🎁",
    "Your amazement shows you're truly living in the moment! ✨",
    "Stay curious, stay surprised, stay amazing! 🌟",
    "The world is full of wonders waiting to surprise you! 🎭",
];

const NEUTRAL: &[&str] = &[
    "Balance is beautiful. You're doing great! ⚖️",
    "Calm and composed, a sign of inner strength! 🧘",
    "Your peaceful energy is admirable! 🕊️",
    "Sometimes the best response is calm presence. Well done! 🌊",
];

const FEAR: &[&str] = &[
    "Courage isn't the absence of fear, it's acting despite it! 🦁",
    "You are braver than you believe. Face your fears! 💪",
    "Every brave person was once afraid. You're on your way! 🌟",
    "Your courage will overcome any fear. Believe in yourself! 🔥",
];

const DISGUST: &[&str] = &[
    "Focus on what brings you joy, not what bothers you! 🌸",
    "Your discernment shows you know your worth! 💎",
    "Choose to see beauty in unexpected places! 🌺",
    "Transform negativity into positive energy! ✨",
];

const DEFAULT_QUOTE: &str = "You are amazing just the way you are! Keep being you! 🌟";

/// Random motivational quote for an emotion label.
pub fn get_quote(emotion: &str) -> String {
    let pool = match emotion.to_lowercase().as_str() {
        "happy" => HAPPY,
        "sad" => SAD,
        "angry" => ANGRY,
        "surprise" | "surprised" => SURPRISE,
        "neutral" => NEUTRAL,
        "fear" => FEAR,
        "disgust" => DISGUST,
        _ => return DEFAULT_QUOTE.to_string(),
    };
    pool.choose(&mut rand::thread_rng()).unwrap_or(&DEFAULT_QUOTE).to_string()
}

/// Friendly message for a count of `noun` (plural form, e.g. "fingers").
pub fn get_counting_message(count: usize, noun: &str) -> String {
    let singular = noun.strip_suffix('s').unwrap_or(noun);
    match count {
        0 => format!("No {noun} detected. Try adjusting your camera or image! 🔍"),
        1 => format!("Found 1 {singular}! Perfect! ✨"),
        2 => format!("Counted 2 {noun}! Great! ✌️"),
        3 => format!("I see 3 {noun}! Nice! 👌"),
        4 => format!("Found 4 {noun}! Excellent! 🎯"),
        5 => format!("Counted 5 {noun}! High five! 🖐️"),
        n => format!("Wow! Counted {n} {noun}! Impressive! 🎉"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_emotion_label_has_quotes() {
        for label in visor_core::EMOTION_LABELS {
            let quote = get_quote(label);
            assert!(!quote.is_empty());
            assert_ne!(quote, DEFAULT_QUOTE, "no quote pool for {label}");
        }
    }

    #[test]
    fn test_unknown_emotion_gets_default() {
        assert_eq!(get_quote("confused"), DEFAULT_QUOTE);
    }

    #[test]
    fn test_quote_case_insensitive() {
        assert_ne!(get_quote("HAPPY"), DEFAULT_QUOTE);
    }

    #[test]
    fn test_counting_messages() {
        assert!(get_counting_message(0, "objects").contains("No objects"));
        assert!(get_counting_message(1, "fingers").contains("1 finger!"));
        assert!(get_counting_message(5, "fingers").contains("High five"));
        assert!(get_counting_message(12, "objects").contains("12 objects"));
    }
}
