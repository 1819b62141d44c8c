//! Course catalog with search, category and level filters.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl CourseLevel {
    pub const ALL: [CourseLevel; 3] = [Self::Beginner, Self::Intermediate, Self::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub provider: String,
    pub category: String,
    pub level: CourseLevel,
    pub duration: String,
    pub rating: f32,
    pub enrolled: u32,
    pub image: String,
    pub description: String,
    pub recommended: bool,
    pub skills: Vec<String>,
}

impl Course {
    /// `needle` must already be lowercase.
    fn matches_search(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.skills.iter().any(|s| s.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workshop {
    pub id: String,
    pub title: String,
    pub date: String,
    pub location: String,
    pub duration: String,
    pub provider: String,
    pub description: String,
}

pub struct CourseCatalog {
    courses: Vec<Course>,
    workshops: Vec<Workshop>,
}

impl CourseCatalog {
    pub fn new(courses: Vec<Course>, workshops: Vec<Workshop>) -> Self {
        Self { courses, workshops }
    }

    pub fn seeded() -> Self {
        Self::new(sample_courses(), sample_workshops())
    }

    pub fn get(&self, id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }

    /// `"all"` followed by each distinct lowercase category.
    pub fn categories(&self) -> Vec<String> {
        let mut out = vec!["all".to_string()];
        for course in &self.courses {
            let c = course.category.to_lowercase();
            if !out.contains(&c) {
                out.push(c);
            }
        }
        out
    }

    pub fn levels(&self) -> Vec<&'static str> {
        std::iter::once("all")
            .chain(CourseLevel::ALL.iter().map(CourseLevel::as_str))
            .collect()
    }

    /// Courses in `category` at `level` (either may be `"all"`) whose
    /// title, description or skills contain `search`.
    pub fn filter(&self, category: &str, level: &str, search: &str) -> Vec<Course> {
        let category = category.to_lowercase();
        let level = level.to_lowercase();
        let needle = search.to_lowercase();
        self.courses
            .iter()
            .filter(|c| category == "all" || c.category.to_lowercase() == category)
            .filter(|c| level == "all" || c.level.as_str() == level)
            .filter(|c| c.matches_search(&needle))
            .cloned()
            .collect()
    }

    pub fn recommended(&self) -> Vec<Course> {
        self.courses.iter().filter(|c| c.recommended).cloned().collect()
    }

    pub fn workshops(&self) -> &[Workshop] {
        &self.workshops
    }
}

#[allow(clippy::too_many_arguments)]
fn course(
    id: &str,
    (title, provider): (&str, &str),
    category: &str,
    level: CourseLevel,
    duration: &str,
    (rating, enrolled): (f32, u32),
    image: &str,
    description: &str,
    recommended: bool,
    skills: &[&str],
) -> Course {
    Course {
        id: id.to_string(),
        title: title.to_string(),
        provider: provider.to_string(),
        category: category.to_string(),
        level,
        duration: duration.to_string(),
        rating,
        enrolled,
        image: format!("https://images.unsplash.com/{image}?q=80&w=240"),
        description: description.to_string(),
        recommended,
        skills: skills.iter().map(|s| s.to_string()).collect(),
    }
}

fn sample_courses() -> Vec<Course> {
    use CourseLevel::*;
    vec![
        course(
            "c001",
            ("Introduction to Web Development", "Tech Academy"),
            "Technology",
            Beginner,
            "6 weeks",
            (4.7, 5280),
            "photo-1593720213428-28a5b9e94613",
            "Learn the fundamentals of web development including HTML, CSS, and JavaScript to build your own responsive websites.",
            true,
            &["HTML", "CSS", "JavaScript", "Responsive Design"],
        ),
        course(
            "c002",
            ("Data Science Fundamentals", "DataLearn"),
            "Data",
            Intermediate,
            "8 weeks",
            (4.8, 3420),
            "photo-1551288049-bebda4e38f71",
            "Master the essentials of data analysis, visualization, and machine learning algorithms to start your data science career.",
            true,
            &["Python", "Statistics", "Data Visualization", "Machine Learning"],
        ),
        course(
            "c003",
            ("UX/UI Design Principles", "Design School"),
            "Design",
            Beginner,
            "4 weeks",
            (4.6, 2150),
            "photo-1545235617-9465d2a55698",
            "Learn user-centered design principles and create engaging digital experiences that delight users.",
            false,
            &["User Research", "Wireframing", "Prototyping", "Visual Design"],
        ),
        course(
            "c004",
            ("Project Management Professional", "PM Institute"),
            "Business",
            Advanced,
            "10 weeks",
            (4.5, 1980),
            "photo-1552664730-d307ca884978",
            "Prepare for the PMP certification and learn advanced project management methodologies, tools, and techniques.",
            false,
            &["Project Planning", "Risk Management", "Stakeholder Management", "Agile"],
        ),
        course(
            "c005",
            ("Digital Marketing Essentials", "Marketing Pro"),
            "Marketing",
            Beginner,
            "6 weeks",
            (4.4, 3750),
            "photo-1432888622747-4eb9a8efeb07",
            "Learn digital marketing strategies including SEO, social media, email marketing, and analytics to grow your online presence.",
            true,
            &["SEO", "Social Media", "Content Marketing", "Analytics"],
        ),
        course(
            "c006",
            ("Cloud Computing Architecture", "Cloud Academy"),
            "Technology",
            Intermediate,
            "8 weeks",
            (4.9, 2340),
            "photo-1451187580459-43490279c0fa",
            "Master cloud infrastructure design, deployment, and management across major cloud platforms.",
            false,
            &["AWS", "Azure", "Cloud Security", "Serverless Architecture"],
        ),
    ]
}

fn workshop(
    id: &str,
    title: &str,
    (date, location, duration): (&str, &str, &str),
    provider: &str,
    description: &str,
) -> Workshop {
    Workshop {
        id: id.to_string(),
        title: title.to_string(),
        date: date.to_string(),
        location: location.to_string(),
        duration: duration.to_string(),
        provider: provider.to_string(),
        description: description.to_string(),
    }
}

fn sample_workshops() -> Vec<Workshop> {
    vec![
        workshop(
            "w001",
            "Agile Development Workshop",
            ("June 15, 2023", "Online", "3 hours"),
            "Agile Experts",
            "A hands-on workshop covering Scrum, Kanban, and implementing agile practices in your organization.",
        ),
        workshop(
            "w002",
            "AI for Business Leaders",
            ("July 8, 2023", "Online", "4 hours"),
            "AI Academy",
            "Learn how to leverage AI technologies to drive business growth and operational efficiency.",
        ),
        workshop(
            "w003",
            "Design Thinking Masterclass",
            ("June 22, 2023", "New York", "Full day"),
            "Innovation Lab",
            "A comprehensive workshop on applying design thinking methodology to solve complex business problems.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(courses: &[Course]) -> Vec<&str> {
        courses.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn categories_and_levels_lead_with_all() {
        let catalog = CourseCatalog::seeded();
        assert_eq!(
            catalog.categories(),
            vec!["all", "technology", "data", "design", "business", "marketing"]
        );
        assert_eq!(catalog.levels(), vec!["all", "beginner", "intermediate", "advanced"]);
    }

    #[test]
    fn search_covers_title_description_and_skills() {
        let catalog = CourseCatalog::seeded();
        assert_eq!(catalog.filter("all", "all", "").len(), 6);
        assert_eq!(ids(&catalog.filter("all", "all", "CLOUD")), vec!["c006"]);
        // Description only.
        assert_eq!(ids(&catalog.filter("all", "all", "delight")), vec!["c003"]);
        // Skill only.
        assert_eq!(ids(&catalog.filter("all", "all", "seo")), vec!["c005"]);
        assert!(catalog.filter("all", "all", "underwater basket").is_empty());
    }

    #[test]
    fn category_and_level_filters_combine() {
        let catalog = CourseCatalog::seeded();
        assert_eq!(ids(&catalog.filter("Technology", "all", "")), vec!["c001", "c006"]);
        assert_eq!(ids(&catalog.filter("technology", "Intermediate", "")), vec!["c006"]);
        assert_eq!(
            ids(&catalog.filter("all", "beginner", "")),
            vec!["c001", "c003", "c005"]
        );
        assert!(catalog.filter("design", "advanced", "").is_empty());
    }

    #[test]
    fn recommended_subset() {
        let catalog = CourseCatalog::seeded();
        assert_eq!(ids(&catalog.recommended()), vec!["c001", "c002", "c005"]);
        assert_eq!(catalog.workshops().len(), 3);
        assert_eq!(catalog.get("c004").unwrap().level, CourseLevel::Advanced);
        assert!(catalog.get("c999").is_none());
    }
}
