//! Career paths browsed by interest.

use serde::Serialize;

/// Interest tags offered as filters.
pub const INTERESTS: [&str; 7] = [
    "Technology",
    "Business",
    "Data",
    "Healthcare",
    "People",
    "Global Issues",
    "Creativity",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CareerPath {
    pub title: String,
    pub short_description: String,
    pub description: String,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    pub growth_outlook: String,
}

impl CareerPath {
    fn shares_interest(&self, selected: &[String]) -> bool {
        self.interests
            .iter()
            .any(|i| selected.iter().any(|s| s.eq_ignore_ascii_case(i)))
    }
}

pub struct CareerPaths {
    paths: Vec<CareerPath>,
}

impl CareerPaths {
    pub fn new(paths: Vec<CareerPath>) -> Self {
        Self { paths }
    }

    pub fn seeded() -> Self {
        Self::new(sample_paths())
    }

    pub fn interests(&self) -> &'static [&'static str] {
        &INTERESTS
    }

    /// Paths sharing at least one selected interest; every path when
    /// nothing is selected.
    pub fn filter_by_interests(&self, selected: &[String]) -> Vec<CareerPath> {
        if selected.is_empty() {
            return self.paths.clone();
        }
        self.paths
            .iter()
            .filter(|p| p.shares_interest(selected))
            .cloned()
            .collect()
    }
}

/// Split a comma-separated interest list, dropping blanks.
pub fn parse_interests(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn path(
    title: &str,
    (short_description, description): (&str, &str),
    skills: &[&str],
    interests: &[&str],
    growth_outlook: &str,
) -> CareerPath {
    CareerPath {
        title: title.to_string(),
        short_description: short_description.to_string(),
        description: description.to_string(),
        skills: owned(skills),
        interests: owned(interests),
        growth_outlook: growth_outlook.to_string(),
    }
}

fn owned(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|x| x.to_string()).collect()
}

fn sample_paths() -> Vec<CareerPath> {
    vec![
        path(
            "Software Developer",
            (
                "Build and maintain applications and systems",
                "Software developers create applications and systems that run on computers and other devices. They apply principles of computer science and mathematics to design, develop, and test software solutions.",
            ),
            &["Coding", "Problem-solving", "Collaboration", "Testing"],
            &["Technology", "Data"],
            "Very Strong",
        ),
        path(
            "Data Scientist",
            (
                "Analyze data to extract meaningful insights",
                "Data scientists collect, analyze, and interpret large datasets to help organizations make better decisions. They use statistical methods, machine learning, and programming to extract insights from data.",
            ),
            &["Statistics", "Programming", "Machine Learning", "Data Visualization"],
            &["Data", "Technology", "Business"],
            "Strong",
        ),
        path(
            "UX Designer",
            (
                "Design user-friendly digital experiences",
                "UX designers focus on creating intuitive, accessible, and enjoyable user experiences for websites and applications. They conduct user research, create wireframes, and collaborate with developers to implement their designs.",
            ),
            &["User Research", "Wireframing", "Prototyping", "Visual Design"],
            &["Creativity", "Technology", "People"],
            "Strong",
        ),
        path(
            "Healthcare Administrator",
            (
                "Manage healthcare facilities and services",
                "Healthcare administrators oversee the business operations of medical facilities, ensuring they run efficiently while providing quality patient care. They manage budgets, staff, and compliance with regulations.",
            ),
            &["Leadership", "Communication", "Finance", "Healthcare Knowledge"],
            &["Healthcare", "Business", "People"],
            "Moderate",
        ),
        path(
            "Environmental Scientist",
            (
                "Study environmental issues and develop solutions",
                "Environmental scientists study the environment and how human activities affect it. They conduct research, analyze data, and develop solutions to environmental problems such as pollution and climate change.",
            ),
            &["Research", "Data Analysis", "Field Work", "Communication"],
            &["Global Issues", "Data", "Healthcare"],
            "Moderate",
        ),
        path(
            "Human Resources Specialist",
            (
                "Manage employee relations and organizational culture",
                "Human resources specialists recruit, screen, and interview job applicants, and handle employee relations, compensation and benefits, and training. They work to create positive workplace cultures and ensure compliance with labor laws.",
            ),
            &["Communication", "Interpersonal", "Organization", "Problem-solving"],
            &["People", "Business"],
            "Stable",
        ),
    ]
}
