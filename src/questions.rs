//! The fixed trivia question bank: an ordered list of questions with one
//! correct answer per index.

use rand::Rng;

/// Built-in question/answer pairs, indexed identically.
const BUILTIN: &[(&str, &str)] = &[
    ("What is the capital of Australia?", "Canberra"),
    ("Which planet has the most moons?", "Saturn"),
    ("What is the largest desert on Earth?", "Antarctica"),
    ("Which animal's fingerprints are nearly identical to a human's?", "Koala"),
    ("What was the first toy advertised on television?", "Mr. Potato Head"),
    ("Which country invented the croissant?", "Austria"),
    ("What is the only mammal capable of true flight?", "Bat"),
    ("Which fruit was once called a 'love apple'?", "Tomato"),
    ("What is the national animal of Scotland?", "Unicorn"),
    ("Which ocean is the deepest?", "Pacific"),
    ("What color is a polar bear's skin?", "Black"),
    ("Which planet spins clockwise?", "Venus"),
    ("What is the most stolen food in the world?", "Cheese"),
    ("Which country has the most time zones?", "France"),
    ("What was Coca-Cola's original color?", "Green"),
    ("Which bird can fly backwards?", "Hummingbird"),
    ("What is the smallest country in the world?", "Vatican City"),
    ("Which metal is liquid at room temperature?", "Mercury"),
    ("What do you call a group of flamingos?", "Flamboyance"),
    ("Which vegetable was the first to be grown in space?", "Potato"),
    ("What is the hardest natural substance on Earth?", "Diamond"),
    ("Which country gifted the Statue of Liberty to the USA?", "France"),
    ("What is the loudest animal on Earth?", "Sperm whale"),
    ("Which sea creature has three hearts?", "Octopus"),
];

/// An ordered, 0-indexed bank of questions and their correct answers.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<String>,
    answers: Vec<String>,
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::builtin()
    }
}

impl QuestionBank {
    /// The bank shipped with the game.
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN
                .iter()
                .map(|(q, a)| ((*q).to_string(), (*a).to_string())),
        )
    }

    /// A bank from arbitrary (question, correct answer) pairs.
    pub fn new(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let (questions, answers) = pairs.into_iter().unzip();
        Self { questions, answers }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn question(&self, index: usize) -> Option<&str> {
        self.questions.get(index).map(String::as_str)
    }

    pub fn correct_answer(&self, index: usize) -> Option<&str> {
        self.answers.get(index).map(String::as_str)
    }

    /// Uniformly random valid index, or `None` for an empty bank.
    pub fn random_index(&self) -> Option<usize> {
        if self.questions.is_empty() {
            return None;
        }
        let mut rng = rand::rng();
        Some(rng.random_range(0..self.questions.len()))
    }
}
