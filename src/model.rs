//! Bible document model: Bible -> Book -> Chapter -> Verse

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verse {
    /// Composite id, `BOOK.CHAPTER.VERSE`
    pub id: String,
    pub number: u32,
    pub text: String,
    #[serde(default)]
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: String,
    pub number: u32,
    #[serde(default)]
    pub verses: Vec<Verse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub name: String,
    pub abbreviation: String,
    pub number: u32,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bible {
    pub id: String,
    pub name: String,
    pub language: String,
    pub version: String,
    pub copyright: String,
    pub is_right_to_left: bool,
    #[serde(default)]
    pub books: Vec<Book>,
}

impl Bible {
    /// All verses in document order.
    pub fn verses(&self) -> impl Iterator<Item = &Verse> {
        self.books
            .iter()
            .flat_map(|b| b.chapters.iter())
            .flat_map(|c| c.verses.iter())
    }

    pub fn book(&self, book_id: &str) -> Option<&Book> {
        self.books.iter().find(|b| b.id == book_id)
    }
}

impl Book {
    pub fn chapter(&self, chapter_id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == chapter_id)
    }
}

/// Book and chapter components of a verse id.
///
/// A verse id is `BOOK.CHAPTER.VERSE`; search filtering keys off the first two
/// components, so an id with fewer than two is not addressable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerseRef<'a> {
    pub book_id: &'a str,
    pub chapter_id: &'a str,
}

impl<'a> VerseRef<'a> {
    pub fn parse(verse_id: &'a str) -> Option<Self> {
        let mut parts = verse_id.split('.');
        let book_id = parts.next()?;
        let chapter_id = parts.next()?;
        Some(Self { book_id, chapter_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verse_ref_splits_book_and_chapter() {
        let r = VerseRef::parse("GEN.1.1").unwrap();
        assert_eq!(r.book_id, "GEN");
        assert_eq!(r.chapter_id, "1");

        let r = VerseRef::parse("PSA.119").unwrap();
        assert_eq!((r.book_id, r.chapter_id), ("PSA", "119"));
    }

    #[test]
    fn verse_ref_requires_two_components() {
        assert!(VerseRef::parse("GEN").is_none());
        assert!(VerseRef::parse("").is_none());
    }

    #[test]
    fn deserializes_camel_case_with_defaults() {
        let json = r#"{
            "id": "web",
            "name": "World English Bible",
            "language": "en",
            "version": "WEB",
            "copyright": "Public Domain",
            "isRightToLeft": false,
            "books": [{
                "id": "GEN", "name": "Genesis", "abbreviation": "Gen", "number": 1,
                "chapters": [{ "id": "1", "number": 1, "verses": [
                    { "id": "GEN.1.1", "number": 1, "text": "In the beginning..." }
                ]}]
            }, {
                "id": "EXO", "name": "Exodus", "abbreviation": "Exo", "number": 2
            }]
        }"#;
        let bible: Bible = serde_json::from_str(json).unwrap();
        assert_eq!(bible.books.len(), 2);
        assert!(bible.books[1].chapters.is_empty());
        let verse = bible.verses().next().unwrap();
        assert_eq!(verse.reference, "");
        assert_eq!(bible.book("GEN").and_then(|b| b.chapter("1")).map(|c| c.verses.len()), Some(1));
    }
}
