//! Discussion board: seeded posts, filtering, voting and new posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Avatar used for authors without one.
pub const DEFAULT_AVATAR: &str = "https://i.pravatar.cc/150?img=8";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForumPost {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: Author,
    pub category: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub upvotes: u32,
    pub downvotes: u32,
    pub comments: u32,
    pub user_vote: Option<VoteDirection>,
}

impl ForumPost {
    /// `needle` must already be lowercase.
    fn matches_search(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.content.to_lowercase().contains(needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
    }

    fn counter(&mut self, direction: VoteDirection) -> &mut u32 {
        match direction {
            VoteDirection::Up => &mut self.upvotes,
            VoteDirection::Down => &mut self.downvotes,
        }
    }

    /// Same direction again removes the vote; the other direction moves it.
    pub fn vote(&mut self, direction: VoteDirection) {
        match self.user_vote {
            Some(prev) if prev == direction => {
                let c = self.counter(direction);
                *c = c.saturating_sub(1);
                self.user_vote = None;
            }
            Some(prev) => {
                let c = self.counter(prev);
                *c = c.saturating_sub(1);
                *self.counter(direction) += 1;
                self.user_vote = Some(direction);
            }
            None => {
                *self.counter(direction) += 1;
                self.user_vote = Some(direction);
            }
        }
    }
}

/// New-post form as submitted.
#[derive(Debug, Clone, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_category")]
    pub category: String,
    /// Comma-separated.
    #[serde(default)]
    pub tags: String,
}

fn default_category() -> String {
    "Technology".to_string()
}

/// Split on commas, trim, and drop empties.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct ForumBoard {
    posts: Vec<ForumPost>,
    next_id: usize,
}

impl ForumBoard {
    pub fn new(posts: Vec<ForumPost>) -> Self {
        let next_id = posts.len() + 1;
        Self { posts, next_id }
    }

    pub fn seeded() -> Self {
        Self::new(sample_posts())
    }

    pub fn posts(&self) -> &[ForumPost] {
        &self.posts
    }

    /// `"all"` followed by each distinct lowercase category, first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut out = vec!["all".to_string()];
        for post in &self.posts {
            let c = post.category.to_lowercase();
            if !out.contains(&c) {
                out.push(c);
            }
        }
        out
    }

    pub fn filter(&self, category: &str, search: &str) -> Vec<ForumPost> {
        let category = category.to_lowercase();
        let needle = search.to_lowercase();
        self.posts
            .iter()
            .filter(|p| category == "all" || p.category.to_lowercase() == category)
            .filter(|p| needle.is_empty() || p.matches_search(&needle))
            .cloned()
            .collect()
    }

    pub fn vote(&mut self, post_id: &str, direction: VoteDirection) -> Option<&ForumPost> {
        let post = self.posts.iter_mut().find(|p| p.id == post_id)?;
        post.vote(direction);
        Some(post)
    }

    /// Validate and prepend a new post.
    pub fn create(&mut self, author: Author, form: &PostForm) -> Result<&ForumPost, ValidationError> {
        if form.title.trim().is_empty() || form.content.trim().is_empty() {
            return Err(ValidationError::IncompletePost);
        }
        let post = ForumPost {
            id: format!("post{}", self.next_id),
            title: form.title.trim().to_string(),
            content: form.content.trim().to_string(),
            author,
            category: form.category.clone(),
            tags: parse_tags(&form.tags),
            created_at: Utc::now(),
            upvotes: 0,
            downvotes: 0,
            comments: 0,
            user_vote: None,
        };
        self.next_id += 1;
        self.posts.insert(0, post);
        Ok(&self.posts[0])
    }
}

#[allow(clippy::too_many_arguments)]
fn sample_post(
    id: &str,
    title: &str,
    content: &str,
    author: (&str, &str, u8),
    category: &str,
    tags: &[&str],
    created_at: &str,
    counts: (u32, u32, u32),
) -> Option<ForumPost> {
    let created_at = DateTime::parse_from_rfc3339(created_at)
        .ok()?
        .with_timezone(&Utc);
    Some(ForumPost {
        id: id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        author: Author {
            id: author.0.to_string(),
            name: author.1.to_string(),
            avatar: format!("https://i.pravatar.cc/150?img={}", author.2),
        },
        category: category.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        created_at,
        upvotes: counts.0,
        downvotes: counts.1,
        comments: counts.2,
        user_vote: None,
    })
}

fn sample_posts() -> Vec<ForumPost> {
    [
        sample_post(
            "1",
            "Tips for new developers starting in web development",
            "I've been in the industry for 5 years and wanted to share some advice for those just getting started...",
            ("user1", "Alex Johnson", 1),
            "Technology",
            &["Web Development", "Career Advice", "Beginners"],
            "2023-12-10T14:30:00Z",
            (24, 2, 8),
        ),
        sample_post(
            "2",
            "How to transition from marketing to product management?",
            "I've been in digital marketing for 3 years but I'm interested in moving to product management. Any advice?",
            ("user2", "Emily Rogers", 5),
            "Marketing",
            &["Career Transition", "Product Management"],
            "2023-12-08T09:15:00Z",
            (15, 0, 12),
        ),
        sample_post(
            "3",
            "Best resources for learning data analysis in 2023",
            "I'm looking to build my skills in data analysis. What courses or books would you recommend?",
            ("user3", "Michael Chen", 3),
            "Data Science",
            &["Learning Resources", "Data Analysis"],
            "2023-12-05T11:45:00Z",
            (42, 3, 16),
        ),
        sample_post(
            "4",
            "How to negotiate a salary for your first job out of college",
            "I'm about to graduate and have my first job offer. How do I approach salary negotiation with no experience?",
            ("user4", "Jamie Williams", 4),
            "Career Advice",
            &["Salary Negotiation", "Entry Level", "New Grad"],
            "2023-12-01T16:20:00Z",
            (67, 1, 23),
        ),
        sample_post(
            "5",
            "Portfolio tips for UX designers",
            "What are hiring managers looking for in UX design portfolios these days?",
            ("user5", "Priya Patel", 10),
            "Design",
            &["UX Design", "Portfolio", "Job Search"],
            "2023-11-28T10:30:00Z",
            (31, 2, 14),
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}
