//! Career-journey testimonials.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::User;
use crate::error::ValidationError;

pub const THANK_YOU: &str = "Thank you for sharing your career journey with us.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Testimonial {
    pub id: u32,
    pub name: String,
    pub initials: String,
    pub role: String,
    pub date: String,
    pub title: String,
    pub content: String,
    pub categories: Vec<String>,
}

/// First letter of each whitespace-separated word.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|w| w.chars().next())
        .collect()
}

fn display_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestimonialForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub story: String,
}

pub struct TestimonialWall {
    entries: Vec<Testimonial>,
}

impl TestimonialWall {
    pub fn seeded() -> Self {
        Self {
            entries: sample_testimonials(),
        }
    }

    pub fn entries(&self) -> &[Testimonial] {
        &self.entries
    }

    /// Validate and prepend a signed-in user's story.
    pub fn submit(&mut self, user: &User, form: &TestimonialForm) -> Result<&Testimonial, ValidationError> {
        if form.title.trim().is_empty() || form.story.trim().is_empty() {
            return Err(ValidationError::IncompleteTestimonial);
        }
        let name = user.display_name();
        let id = self.entries.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let entry = Testimonial {
            id,
            initials: initials(&name),
            name,
            role: user.role.to_string(),
            date: display_date(Utc::now().date_naive()),
            title: form.title.trim().to_string(),
            content: form.story.trim().to_string(),
            categories: Vec::new(),
        };
        self.entries.insert(0, entry);
        Ok(&self.entries[0])
    }
}

fn sample(
    id: u32,
    (name, role): (&str, &str),
    (year, month, day): (i32, u32, u32),
    title: &str,
    content: &str,
    categories: &[&str],
) -> Testimonial {
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .map(display_date)
        .unwrap_or_default();
    Testimonial {
        id,
        name: name.to_string(),
        initials: initials(name),
        role: role.to_string(),
        date,
        title: title.to_string(),
        content: content.to_string(),
        categories: categories.iter().map(|c| c.to_string()).collect(),
    }
}

fn sample_testimonials() -> Vec<Testimonial> {
    vec![
        sample(
            1,
            ("Alex Johnson", "Software Developer"),
            (2023, 5, 15),
            "From Lost Graduate to Tech Professional",
            "After finishing my degree in biology, I felt completely lost about what career to pursue. The assessment on WayPoint highlighted my analytical thinking and problem-solving abilities, suggesting tech as a potential path. I took some coding courses, discovered I loved it, and now I'm a software developer at a health tech company where I can combine both my interests!",
            &["Career Change", "Technology"],
        ),
        sample(
            2,
            ("Priya Patel", "UX Designer"),
            (2023, 6, 3),
            "Found My Creative Calling",
            "I spent years in marketing but always felt something was missing. WayPoint's assessment revealed my strong creative and empathetic tendencies, suggesting user experience design as a potential fit. The resources provided helped me transition into UX design, and I couldn't be happier with where my career is now.",
            &["Design", "Career Change"],
        ),
        sample(
            3,
            ("Marcus Williams", "Environmental Scientist"),
            (2023, 4, 22),
            "Aligning My Work With My Values",
            "I always knew I cared deeply about sustainability, but wasn't sure how to make it my career. The personality assessment on WayPoint helped me understand that I need work aligned with my core values. The recommended resources and mentorship connections helped me transition into environmental science where I now work on climate solutions.",
            &["Science", "Purpose-Driven"],
        ),
        sample(
            4,
            ("Jordan Taylor", "Healthcare Administrator"),
            (2023, 7, 10),
            "From Burnout to Balance",
            "After experiencing burnout as a clinical nurse, I wasn't sure if I needed to leave healthcare altogether. WayPoint helped me see that I could use my healthcare knowledge in administrative roles that would better suit my work style preferences. I now have a fulfilling career with much better work-life balance.",
            &["Healthcare", "Work-Life Balance"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::UserRole;

    fn student() -> User {
        User {
            id: "3".into(),
            username: "student".into(),
            email: "student@waypoint.com".into(),
            role: UserRole::Student,
            first_name: Some("Student".into()),
            last_name: Some("Example".into()),
            avatar_url: None,
        }
    }

    #[test]
    fn seeded_entries_have_initials_and_dates() {
        let wall = TestimonialWall::seeded();
        assert_eq!(wall.entries().len(), 4);
        assert_eq!(wall.entries()[0].initials, "AJ");
        assert_eq!(wall.entries()[0].date, "May 15, 2023");
        assert_eq!(wall.entries()[1].date, "June 3, 2023");
    }

    #[test]
    fn initials_skip_extra_whitespace() {
        assert_eq!(initials("  Jordan   Taylor "), "JT");
        assert_eq!(initials(""), "");
    }

    #[test]
    fn submit_requires_both_fields() {
        let mut wall = TestimonialWall::seeded();
        let err = wall
            .submit(
                &student(),
                &TestimonialForm {
                    title: "My path".into(),
                    story: " ".into(),
                },
            )
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Please fill in all fields to share your testimonial."
        );
        assert_eq!(wall.entries().len(), 4);
    }

    #[test]
    fn submit_prepends_entry() {
        let mut wall = TestimonialWall::seeded();
        let entry = wall
            .submit(
                &student(),
                &TestimonialForm {
                    title: "My path".into(),
                    story: "It went well.".into(),
                },
            )
            .unwrap();
        assert_eq!(entry.id, 5);
        assert_eq!(entry.name, "Student Example");
        assert_eq!(entry.initials, "SE");
        assert_eq!(wall.entries()[0].title, "My path");
    }
}
