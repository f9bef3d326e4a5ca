//! The comments part (`word/comments.xml`) and people part (`word/people.xml`).

use crate::error::{Error, Result};
use crate::model::{Paragraph, Table};
use crate::package::xml::{Element, Node};
use crate::package::{resolve_target, Package, REL_COMMENTS, REL_PEOPLE};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const W15_NS: &str = "http://schemas.microsoft.com/office/word/2012/wordml";

/// Content type of the comments part.
pub const COMMENTS_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.comments+xml";
/// Content type of the people part.
pub const PEOPLE_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.people+xml";

/// A review comment as stored in the comments part.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// Comment id, unique within the document
    pub id: u32,
    /// Author name
    pub author: String,
    /// Author initials
    pub initials: String,
    /// ISO-8601 date, if recorded
    pub date: Option<String>,
    element: Element,
}

impl Comment {
    pub(crate) fn new(
        id: u32,
        author: &str,
        initials: &str,
        date: Option<String>,
        element: Element,
    ) -> Self {
        Self {
            id,
            author: author.to_string(),
            initials: initials.to_string(),
            date,
            element,
        }
    }

    /// Read a `w:comment`; the element comes back when its id is not a `u32`.
    pub(crate) fn from_element(element: Element) -> std::result::Result<Self, Element> {
        let Some(id) = element.attr("w:id").and_then(|id| id.parse().ok()) else {
            return Err(element);
        };
        Ok(Self {
            id,
            author: element.attr("w:author").unwrap_or_default().to_string(),
            initials: element.attr("w:initials").unwrap_or_default().to_string(),
            date: element.attr("w:date").map(str::to_string),
            element,
        })
    }

    /// The `w:comment` element.
    pub fn element(&self) -> &Element {
        &self.element
    }

    /// Body text: paragraphs separated by newlines, table cells by tabs.
    ///
    /// A paragraph that only carries the annotation mark is not counted.
    pub fn text(&self) -> String {
        self.element
            .elements()
            .filter_map(|block| match block.name.as_str() {
                "w:p" => {
                    let marker_only = block.descendants_named("w:annotationRef").len() == 1
                        && block.descendants_named("w:t").is_empty();
                    if marker_only {
                        None
                    } else {
                        Some(Paragraph::from_element(block.clone()).text())
                    }
                }
                "w:tbl" => Some(Table::from_element(block.clone()).plain_text()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A reviewer identity from the people part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    /// Author name, matches `w:comment/@w:author`
    pub author: String,
    /// Presence provider (`None` for local authors)
    pub provider_id: String,
    /// Provider user id
    pub user_id: String,
}

/// All comments and reviewer identities of a document.
#[derive(Debug, Clone)]
pub struct CommentsPart {
    comments: Vec<Comment>,
    people: Vec<Person>,
    next_id: Option<u32>,
    comments_root: Element,
    people_root: Element,
    part_name: String,
    people_part_name: String,
    modified: bool,
}

impl Default for CommentsPart {
    fn default() -> Self {
        Self {
            comments: Vec::new(),
            people: Vec::new(),
            next_id: Some(0),
            comments_root: Element::new("w:comments").with_attr("xmlns:w", W_NS),
            people_root: Element::new("w15:people")
                .with_attr("xmlns:w", W_NS)
                .with_attr("xmlns:w15", W15_NS),
            part_name: "word/comments.xml".to_string(),
            people_part_name: "word/people.xml".to_string(),
            modified: false,
        }
    }
}

impl CommentsPart {
    /// An empty comments part.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load existing comments and people referenced from the main part.
    pub fn load(package: &Package, main_part: &str) -> Result<Self> {
        let mut part = Self::new();
        let rels = package.relationships_of(main_part)?;

        if let Some(rel) = rels.by_type(REL_COMMENTS) {
            part.part_name = resolve_target(main_part, &rel.target);
        }
        if let Some(rel) = rels.by_type(REL_PEOPLE) {
            part.people_part_name = resolve_target(main_part, &rel.target);
        }

        if package.contains(&part.part_name) {
            let mut root = Element::parse(&package.part_text(&part.part_name)?)?;
            // Children that are not readable comments stay in the root as written.
            for node in std::mem::take(&mut root.children) {
                match node {
                    Node::Element(e) if e.is("w:comment") => match Comment::from_element(e) {
                        Ok(comment) => part.comments.push(comment),
                        Err(e) => {
                            log::warn!(
                                "Keeping comment with unreadable id {:?} as is",
                                e.attr("w:id").unwrap_or_default()
                            );
                            root.children.push(Node::Element(e));
                        }
                    },
                    other => root.children.push(other),
                }
            }
            part.comments_root = root;
        }

        if package.contains(&part.people_part_name) {
            let mut root = Element::parse(&package.part_text(&part.people_part_name)?)?;
            part.people = root
                .children_named("w15:person")
                .filter_map(|p| {
                    let presence = p.child("w15:presenceInfo");
                    Some(Person {
                        author: p.attr("w15:author")?.to_string(),
                        provider_id: presence
                            .and_then(|i| i.attr("w15:providerId"))
                            .unwrap_or("None")
                            .to_string(),
                        user_id: presence
                            .and_then(|i| i.attr("w15:userId"))
                            .unwrap_or_default()
                            .to_string(),
                    })
                })
                .collect();
            root.children.retain(|n| !matches!(n, Node::Element(e) if e.is("w15:person")));
            part.people_root = root;
        }

        part.next_id = match part.comments.iter().map(|c| c.id).max() {
            Some(max) => max.checked_add(1),
            None => Some(0),
        };
        Ok(part)
    }

    /// All comments in part order.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Find a comment by id.
    pub fn get(&self, id: u32) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }

    /// Number of comments.
    pub fn len(&self) -> usize {
        self.comments.len()
    }

    /// Whether there are no comments.
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// All reviewer identities.
    pub fn people(&self) -> &[Person] {
        &self.people
    }

    /// The id the next comment will receive, `None` once every id is taken.
    pub fn next_id(&self) -> Option<u32> {
        self.next_id
    }

    pub(crate) fn allocate_id(&mut self) -> Result<u32> {
        let id = self
            .next_id
            .ok_or_else(|| Error::Other("no comment ids left".to_string()))?;
        self.next_id = id.checked_add(1);
        Ok(id)
    }

    pub(crate) fn push(&mut self, comment: Comment) {
        self.comments.push(comment);
        self.modified = true;
    }

    /// Remove a comment from the part. The id is never handed out again.
    pub(crate) fn remove(&mut self, id: u32) -> Option<Comment> {
        let index = self.comments.iter().position(|c| c.id == id)?;
        self.modified = true;
        Some(self.comments.remove(index))
    }

    /// Record a reviewer identity unless one with this author already exists.
    pub(crate) fn ensure_person(&mut self, author: &str) {
        if self.people.iter().any(|p| p.author == author) {
            return;
        }
        self.people.push(Person {
            author: author.to_string(),
            provider_id: "None".to_string(),
            user_id: author.to_string(),
        });
        self.modified = true;
    }

    /// Write the comments and people parts, their content types and relationships.
    ///
    /// Does nothing when the comments were not changed since loading.
    pub(crate) fn write_into(&self, package: &mut Package, main_part: &str) -> Result<()> {
        if !self.modified {
            return Ok(());
        }

        let mut comments_root = self.comments_root.clone();
        comments_root
            .children
            .extend(self.comments.iter().map(|c| Node::Element(c.element.clone())));
        package.set_part(&self.part_name, comments_root.to_xml_bytes()?);

        let mut people_root = self.people_root.clone();
        for person in &self.people {
            people_root.children.push(Node::Element(
                Element::new("w15:person")
                    .with_attr("w15:author", person.author.as_str())
                    .with_child(
                        Element::new("w15:presenceInfo")
                            .with_attr("w15:providerId", person.provider_id.as_str())
                            .with_attr("w15:userId", person.user_id.as_str()),
                    ),
            ));
        }
        package.set_part(&self.people_part_name, people_root.to_xml_bytes()?);

        let mut content_types = package.content_types()?;
        let changed_comments =
            content_types.ensure_override(&self.part_name, COMMENTS_CONTENT_TYPE);
        let changed_people =
            content_types.ensure_override(&self.people_part_name, PEOPLE_CONTENT_TYPE);
        if changed_comments || changed_people {
            package.set_part(crate::package::CONTENT_TYPES_PART, content_types.to_xml_bytes()?);
        }

        let mut rels = package.relationships_of(main_part)?;
        let before = rels.entries().len();
        rels.ensure(REL_COMMENTS, &relative_target(main_part, &self.part_name));
        rels.ensure(REL_PEOPLE, &relative_target(main_part, &self.people_part_name));
        if rels.entries().len() != before {
            package.set_relationships(main_part, &rels)?;
        }

        log::debug!(
            "Wrote {} comments and {} people to {}",
            self.comments.len(),
            self.people.len(),
            self.part_name
        );
        Ok(())
    }
}

/// Target of `part` relative to the folder of `source`, when they share one.
fn relative_target(source: &str, part: &str) -> String {
    match source.rsplit_once('/') {
        Some((dir, _)) => match part.strip_prefix(&format!("{dir}/")) {
            Some(relative) => relative.to_string(),
            None => format!("/{part}"),
        },
        None => part.to_string(),
    }
}
