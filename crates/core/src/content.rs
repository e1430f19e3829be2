//! Portfolio content: skills and projects
//!
//! Both documents come from JSON feeds. When a feed fails the client shows
//! the built-in fallbacks instead: a six-axis skill overview and an empty
//! project list.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FolioError;

/// Languages tried, in order, after the requested one
const TEXT_FALLBACK_LANGUAGES: [&str; 2] = ["en", "de"];

/// Text that is either shared by all languages or translated per language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalizedText {
    Plain(String),
    Localized(BTreeMap<String, String>),
}

impl LocalizedText {
    /// Text for `lang`, falling back to English, German, then any
    /// non-empty entry
    pub fn get(&self, lang: &str) -> &str {
        match self {
            Self::Plain(text) => text,
            Self::Localized(map) => std::iter::once(lang)
                .chain(TEXT_FALLBACK_LANGUAGES)
                .find_map(|code| map.get(code).filter(|text| !text.is_empty()))
                .or_else(|| map.values().find(|text| !text.is_empty()))
                .map_or("", String::as_str),
        }
    }
}

impl Default for LocalizedText {
    fn default() -> Self {
        Self::Plain(String::new())
    }
}

// -----------------------------------------------------------------------
// Skills
// -----------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    /// Name of the owning [`SkillCategory`]
    pub category: String,
    /// Proficiency, 0 to 100
    pub level: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCategory {
    pub name: String,
    /// Chart colour as `#rrggbb`
    pub color: String,
    /// Display name; the `skills.<name>` translation is preferred when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
}

impl SkillCategory {
    /// Translation key for the category's display name
    pub fn label_key(&self) -> String {
        format!("skills.{}", self.name)
    }

    /// Display name in `lang`: translation, then feed label, then raw name
    pub fn display_label<'a, F>(&'a self, lang: &str, translate: F) -> String
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        translate(&self.label_key())
            .or_else(|| self.label.as_ref().map(|label| label.get(lang)))
            .filter(|label| !label.is_empty())
            .unwrap_or(self.name.as_str())
            .to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillsDocument {
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub categories: Vec<SkillCategory>,
}

impl SkillsDocument {
    /// Overview shown when the skills feed is unavailable
    pub fn fallback() -> Self {
        const AXES: [(&str, u8); 6] = [
            ("frontend", 85),
            ("backend", 90),
            ("databases", 80),
            ("algorithms", 75),
            ("tools", 85),
            ("oop", 95),
        ];
        let categories = AXES
            .iter()
            .map(|(name, _)| SkillCategory {
                name: (*name).to_string(),
                color: "#6366f1".to_string(),
                label: None,
                description: None,
            })
            .collect();
        let skills = AXES
            .iter()
            .map(|(name, level)| Skill {
                name: (*name).to_string(),
                category: (*name).to_string(),
                level: *level,
                icon: None,
            })
            .collect();
        Self { skills, categories }
    }

    /// Skills of one category, in document order
    pub fn skills_in<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Skill> + 'a {
        self.skills.iter().filter(move |skill| skill.category == category)
    }

    /// Skills grouped under their category, in category order
    ///
    /// Skills naming an unknown category are left out.
    pub fn by_category(&self) -> Vec<(&SkillCategory, Vec<&Skill>)> {
        self.categories
            .iter()
            .map(|category| (category, self.skills_in(&category.name).collect()))
            .collect()
    }

    /// Rounded mean level of a category, 0 when it has no skills
    pub fn average_level(&self, category: &str) -> u32 {
        let (total, count) = self
            .skills_in(category)
            .fold((0u32, 0u32), |(total, count), skill| (total + u32::from(skill.level), count + 1));
        if count == 0 {
            return 0;
        }
        (f64::from(total) / f64::from(count)).round() as u32
    }
}

// -----------------------------------------------------------------------
// Projects
// -----------------------------------------------------------------------

/// Link value meaning "no link"
pub const NO_LINK: &str = "#";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub title: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default = "no_link")]
    pub demo_link: String,
    #[serde(default = "no_link")]
    pub code_link: String,
    /// Only an explicit `false` hides a project
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}

fn no_link() -> String {
    NO_LINK.to_string()
}

impl Project {
    pub fn is_featured(&self) -> bool {
        self.featured != Some(false)
    }

    pub fn has_demo(&self) -> bool {
        !self.demo_link.is_empty() && self.demo_link != NO_LINK
    }

    pub fn matches(&self, filter: &ProjectFilter) -> bool {
        match filter {
            ProjectFilter::All => true,
            ProjectFilter::Category(category) => &self.category == category,
        }
    }
}

/// Project grid filter
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProjectFilter {
    #[default]
    All,
    Category(String),
}

impl FromStr for ProjectFilter {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(FolioError::Validation("empty project filter".into())),
            "all" => Ok(Self::All),
            category => Ok(Self::Category(category.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectsDocument {
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl ProjectsDocument {
    /// Empty list shown when the projects feed is unavailable
    pub fn fallback() -> Self {
        Self::default()
    }

    /// Projects that are not explicitly hidden
    pub fn featured(&self) -> Vec<&Project> {
        self.projects.iter().filter(|project| project.is_featured()).collect()
    }

    /// Featured projects matching `filter`
    pub fn filter(&self, filter: &ProjectFilter) -> Vec<&Project> {
        self.projects
            .iter()
            .filter(|project| project.is_featured() && project.matches(filter))
            .collect()
    }

    /// Distinct categories of featured projects, in first-seen order
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for project in self.featured() {
            if !project.category.is_empty() && !seen.contains(&project.category.as_str()) {
                seen.push(project.category.as_str());
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for content.
    use serde_json::json;

    use super::*;

    fn projects() -> ProjectsDocument {
        serde_json::from_value(json!({
            "projects": [
                {
                    "title": { "de": "Shop", "en": "Store" },
                    "description": { "de": "Ein Shop" },
                    "image": "img/shop.png",
                    "technologies": ["Rust", "SQL"],
                    "category": "backend",
                    "demoLink": "https://shop.example.org",
                    "codeLink": "https://git.example.org/shop"
                },
                {
                    "title": "Dashboard",
                    "category": "frontend",
                    "demoLink": "#",
                    "codeLink": "https://git.example.org/dash",
                    "featured": true
                },
                {
                    "title": { "en": "Hidden" },
                    "category": "frontend",
                    "featured": false
                }
            ]
        }))
        .unwrap()
    }

    /// Validates the language fallback chain.
    ///
    /// Assertions:
    /// - Confirms the requested language wins.
    /// - Confirms English, then German, then any entry is used.
    #[test]
    fn test_localized_text_fallback() {
        let text: LocalizedText =
            serde_json::from_value(json!({ "de": "Hallo", "en": "Hello", "ru": "" })).unwrap();
        assert_eq!(text.get("de"), "Hallo");
        assert_eq!(text.get("ru"), "Hello");
        assert_eq!(text.get("fr"), "Hello");

        let german_only: LocalizedText = serde_json::from_value(json!({ "de": "Hallo" })).unwrap();
        assert_eq!(german_only.get("en"), "Hallo");

        let other: LocalizedText = serde_json::from_value(json!({ "uk": "Привіт" })).unwrap();
        assert_eq!(other.get("en"), "Привіт");

        assert_eq!(LocalizedText::Plain("Same".into()).get("ru"), "Same");
    }

    /// Validates featured filtering and demo detection.
    ///
    /// Assertions:
    /// - Confirms a missing `featured` counts as featured.
    /// - Confirms `#` means no demo.
    #[test]
    fn test_featured_and_demo() {
        let doc = projects();
        let featured = doc.featured();
        assert_eq!(featured.len(), 2);
        assert!(featured[0].has_demo());
        assert!(!featured[1].has_demo());
        assert_eq!(doc.projects[2].code_link, NO_LINK);
    }

    /// Validates category filtering.
    ///
    /// Assertions:
    /// - Confirms `all` keeps every featured project.
    /// - Confirms hidden projects never match a category.
    #[test]
    fn test_project_filter() {
        let doc = projects();
        assert_eq!(doc.filter(&"all".parse().unwrap()).len(), 2);

        let frontend = doc.filter(&ProjectFilter::Category("frontend".into()));
        assert_eq!(frontend.len(), 1);
        assert_eq!(frontend[0].title.get("en"), "Dashboard");

        assert_eq!(doc.categories(), vec!["backend", "frontend"]);
        assert!("  ".parse::<ProjectFilter>().is_err());
    }

    /// Validates grouping and averages.
    ///
    /// Assertions:
    /// - Confirms category order is preserved.
    /// - Confirms averages round half up.
    /// - Confirms an empty category averages to zero.
    #[test]
    fn test_skills_grouping() {
        let doc: SkillsDocument = serde_json::from_value(json!({
            "skills": [
                { "name": "Rust", "category": "backend", "level": 90 },
                { "name": "Go", "category": "backend", "level": 75 },
                { "name": "CSS", "category": "frontend", "level": 80 },
                { "name": "Lisp", "category": "unknown", "level": 10 }
            ],
            "categories": [
                { "name": "frontend", "color": "#ff0000" },
                { "name": "backend", "color": "#00ff00" },
                { "name": "design", "color": "#0000ff" }
            ]
        }))
        .unwrap();

        let groups = doc.by_category();
        let names: Vec<_> = groups.iter().map(|(c, s)| (c.name.as_str(), s.len())).collect();
        assert_eq!(names, vec![("frontend", 1), ("backend", 2), ("design", 0)]);
        assert_eq!(doc.average_level("backend"), 83);
        assert_eq!(doc.average_level("design"), 0);
    }

    /// Validates the built-in skills overview.
    ///
    /// Assertions:
    /// - Confirms six axes with their levels.
    #[test]
    fn test_skills_fallback() {
        let doc = SkillsDocument::fallback();
        assert_eq!(doc.categories.len(), 6);
        assert_eq!(doc.average_level("oop"), 95);
        assert_eq!(doc.average_level("algorithms"), 75);
        assert!(ProjectsDocument::fallback().featured().is_empty());
    }

    /// Validates category display names.
    ///
    /// Assertions:
    /// - Confirms a translation beats the feed label.
    /// - Confirms the feed label beats the raw name.
    #[test]
    fn test_category_display_label() {
        let category: SkillCategory = serde_json::from_value(json!({
            "name": "backend",
            "color": "#10b981",
            "label": { "de": "Serverseite", "en": "Server side" }
        }))
        .unwrap();

        assert_eq!(category.label_key(), "skills.backend");
        assert_eq!(category.display_label("de", |_| Some("Backend-Entwicklung")), "Backend-Entwicklung");
        assert_eq!(category.display_label("en", |_| None), "Server side");

        let bare = SkillCategory { label: None, ..category };
        assert_eq!(bare.display_label("en", |_| None), "backend");
    }
}
