//! Quiz questions and the built-in career-interest catalog.

use serde::Serialize;

/// One multiple-choice quiz question. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: u32,
    pub prompt: String,
    pub options: Vec<String>,
}

impl Question {
    pub fn new(id: u32, prompt: impl Into<String>, options: &[&str]) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o == value)
    }
}

const CAREER_INTERESTS: &[(&str, [&str; 4])] = &[
    (
        "How do you prefer to solve problems?",
        [
            "By analyzing data and facts",
            "By thinking creatively and outside the box",
            "By discussing with others to find solutions",
            "By following established procedures and methods",
        ],
    ),
    (
        "Which of these work environments appeals to you most?",
        [
            "A structured environment with clear rules and expectations",
            "A flexible environment that allows for creativity and innovation",
            "A collaborative environment with team-based projects",
            "An independent environment where I can work at my own pace",
        ],
    ),
    (
        "When working on projects, what aspect do you enjoy most?",
        [
            "Planning and organizing the details",
            "Coming up with new ideas and concepts",
            "Collaborating with others and sharing thoughts",
            "Implementing and executing the plan",
        ],
    ),
    (
        "Which of these skills would you most like to develop further?",
        [
            "Technical or specialized skills",
            "Creative thinking and design skills",
            "Communication and interpersonal skills",
            "Leadership and management skills",
        ],
    ),
    (
        "How do you prefer to learn new information?",
        [
            "Through hands-on experience and practice",
            "Through reading and researching independently",
            "Through discussion and collaborative learning",
            "Through structured courses and guided instruction",
        ],
    ),
    (
        "Which type of task gives you the most satisfaction?",
        [
            "Solving complex problems",
            "Creating something new and innovative",
            "Helping others achieve their goals",
            "Improving systems and processes",
        ],
    ),
    (
        "What type of recognition motivates you most?",
        [
            "Recognition for technical expertise",
            "Recognition for creative contributions",
            "Recognition for teamwork and collaboration",
            "Recognition for efficiency and reliability",
        ],
    ),
    (
        "Which of these subjects interests you the most?",
        [
            "Science and mathematics",
            "Arts and humanities",
            "Social sciences and communication",
            "Business and economics",
        ],
    ),
];

/// The eight-question career-interest quiz, ids starting at 1.
pub fn career_interest_questions() -> Vec<Question> {
    CAREER_INTERESTS
        .iter()
        .zip(1..)
        .map(|((prompt, options), id)| Question::new(id, *prompt, options))
        .collect()
}
