//! Career matches shown after the quiz.
//!
//! Percentages come from a fixed catalog; no scoring is derived from answers.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CareerMatch {
    pub title: String,
    /// 0–100.
    pub match_percentage: u8,
    pub description: String,
    pub skills: Vec<String>,
    pub education_path: String,
}

impl CareerMatch {
    pub fn new(
        title: &str,
        match_percentage: u8,
        description: &str,
        skills: &[&str],
        education_path: &str,
    ) -> Self {
        Self {
            title: title.to_string(),
            match_percentage: match_percentage.min(100),
            description: description.to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            education_path: education_path.to_string(),
        }
    }
}

/// Highest match first. Stable: equal percentages keep their input order.
pub fn sort_by_match_descending(mut matches: Vec<CareerMatch>) -> Vec<CareerMatch> {
    matches.sort_by(|a, b| b.match_percentage.cmp(&a.match_percentage));
    matches
}

/// The sample catalog, already sorted.
pub fn career_catalog() -> Vec<CareerMatch> {
    sort_by_match_descending(vec![
        CareerMatch::new(
            "Software Developer",
            92,
            "Design, develop, and maintain software applications using programming languages and development tools. Software developers create everything from mobile apps to enterprise systems.",
            &["Programming", "Problem-solving", "Analytical thinking", "Attention to detail"],
            "Bachelor's degree in Computer Science, Software Engineering, or related field; many developers also gain skills through bootcamps or self-teaching.",
        ),
        CareerMatch::new(
            "Data Analyst",
            87,
            "Analyze data to identify trends, create visualizations, and generate insights that inform business decisions. Data analysts work across industries to help organizations leverage their data.",
            &["Statistical analysis", "Data visualization", "SQL", "Excel", "Critical thinking"],
            "Bachelor's degree in Statistics, Mathematics, Computer Science, Economics, or a related field; specialized certifications can also be valuable.",
        ),
        CareerMatch::new(
            "UX Designer",
            84,
            "Create user-centered designs for digital products and services. UX designers conduct research, create wireframes and prototypes, and collaborate with developers to implement designs.",
            &["User research", "Wireframing", "Prototyping", "Visual design", "Empathy"],
            "Bachelor's degree in Design, Human-Computer Interaction, or related field; many designers also have specialized UX certificates or bootcamp training.",
        ),
        CareerMatch::new(
            "Digital Marketing Specialist",
            79,
            "Develop and implement digital marketing campaigns across various channels. Digital marketers manage social media, email marketing, content creation, and analyze campaign performance.",
            &["Content creation", "Social media management", "Analytics", "SEO/SEM", "Communication"],
            "Bachelor's degree in Marketing, Communications, or Business; specialized digital marketing certifications are highly valued.",
        ),
        CareerMatch::new(
            "Project Manager",
            73,
            "Plan, execute, and close projects while ensuring they're delivered on time, within scope, and on budget. Project managers work across industries coordinating teams and resources.",
            &["Leadership", "Organization", "Communication", "Problem-solving", "Risk management"],
            "Bachelor's degree in Business, Management, or field related to the industry; PMP or other project management certifications are often required.",
        ),
    ])
}
