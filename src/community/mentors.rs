//! Mentor directory.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mentor {
    pub id: String,
    pub name: String,
    pub title: String,
    pub company: String,
    pub industry: String,
    pub expertise: Vec<String>,
    /// Years.
    pub experience: u32,
    pub availability: String,
    pub bio: String,
    pub avatar: String,
}

impl Mentor {
    /// `needle` must already be lowercase.
    fn matches_search(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.industry.to_lowercase().contains(needle)
            || self.expertise.iter().any(|e| e.to_lowercase().contains(needle))
    }
}

pub struct MentorDirectory {
    mentors: Vec<Mentor>,
}

impl MentorDirectory {
    pub fn new(mentors: Vec<Mentor>) -> Self {
        Self { mentors }
    }

    pub fn seeded() -> Self {
        Self::new(sample_mentors())
    }

    pub fn get(&self, id: &str) -> Option<&Mentor> {
        self.mentors.iter().find(|m| m.id == id)
    }

    /// `"all"` followed by each distinct lowercase industry.
    pub fn industries(&self) -> Vec<String> {
        let mut out = vec!["all".to_string()];
        for mentor in &self.mentors {
            let i = mentor.industry.to_lowercase();
            if !out.contains(&i) {
                out.push(i);
            }
        }
        out
    }

    pub fn filter(&self, industry: &str, search: &str) -> Vec<Mentor> {
        let industry = industry.to_lowercase();
        let needle = search.to_lowercase();
        self.mentors
            .iter()
            .filter(|m| industry == "all" || m.industry.to_lowercase() == industry)
            .filter(|m| m.matches_search(&needle))
            .cloned()
            .collect()
    }
}

/// Notice text for a mentorship request.
pub fn request_message(mentor: &Mentor) -> String {
    format!("Mentorship request sent to {}", mentor.name)
}

#[allow(clippy::too_many_arguments)]
fn mentor(
    id: &str,
    (name, title, company): (&str, &str, &str),
    industry: &str,
    expertise: &[&str],
    experience: u32,
    availability: &str,
    bio: &str,
    avatar_img: u8,
) -> Mentor {
    Mentor {
        id: id.to_string(),
        name: name.to_string(),
        title: title.to_string(),
        company: company.to_string(),
        industry: industry.to_string(),
        expertise: expertise.iter().map(|e| e.to_string()).collect(),
        experience,
        availability: availability.to_string(),
        bio: bio.to_string(),
        avatar: format!("https://i.pravatar.cc/150?img={avatar_img}"),
    }
}

fn sample_mentors() -> Vec<Mentor> {
    vec![
        mentor(
            "1",
            ("Alex Johnson", "Senior Software Engineer", "Tech Innovations Inc."),
            "Technology",
            &["Web Development", "React", "Node.js"],
            8,
            "Evenings and weekends",
            "Passionate about helping junior developers grow their skills in web development with a focus on React ecosystem.",
            1,
        ),
        mentor(
            "2",
            ("Sarah Williams", "Marketing Director", "Brand Solutions"),
            "Marketing",
            &["Digital Marketing", "Brand Strategy", "Social Media"],
            12,
            "Tuesday afternoons, Friday mornings",
            "Marketing professional helping newcomers understand the digital landscape and develop effective strategies.",
            5,
        ),
        mentor(
            "3",
            ("Michael Chen", "Data Scientist", "Analytics Pro"),
            "Data Science",
            &["Machine Learning", "Python", "Data Visualization"],
            6,
            "Weekday evenings",
            "Data scientist with a passion for teaching others how to extract meaningful insights from complex datasets.",
            3,
        ),
        mentor(
            "4",
            ("Priya Patel", "UX/UI Designer", "Design Forward"),
            "Design",
            &["User Research", "Wireframing", "Figma", "UI Design"],
            7,
            "Monday and Wednesday afternoons",
            "Designer helping aspiring UX/UI professionals develop their portfolio and practical skills.",
            10,
        ),
        mentor(
            "5",
            ("James Wilson", "Project Manager", "Agile Solutions"),
            "Project Management",
            &["Agile Methodology", "Scrum", "Team Leadership"],
            10,
            "Thursday afternoons",
            "Experienced project manager helping professionals transition into leadership roles.",
            11,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn industries_in_first_seen_order() {
        let dir = MentorDirectory::seeded();
        assert_eq!(
            dir.industries(),
            vec!["all", "technology", "marketing", "data science", "design", "project management"]
        );
    }

    #[test]
    fn search_covers_name_industry_and_expertise() {
        let dir = MentorDirectory::seeded();
        assert_eq!(dir.filter("all", "").len(), 5);
        assert_eq!(dir.filter("all", "python")[0].name, "Michael Chen");
        assert_eq!(dir.filter("all", "MARKETING")[0].id, "2");
        assert_eq!(dir.filter("all", "sarah")[0].id, "2");
        assert!(dir.filter("design", "scrum").is_empty());
        assert_eq!(dir.filter("Project Management", "scrum").len(), 1);
    }

    #[test]
    fn request_notice_names_mentor() {
        let dir = MentorDirectory::seeded();
        let m = dir.get("4").unwrap();
        assert_eq!(request_message(m), "Mentorship request sent to Priya Patel");
        assert!(dir.get("99").is_none());
    }
}
