//! Note collections (notebooks).
//!
//! A collection exists on the server only through the notes that name it.
//! Collections the user created before filing any note into them live in
//! the local [`Database`] and are merged in at render time.

use thiserror::Error;
use tracing::{debug, info};

use crate::aggregate::group_by_collection;
use crate::database::{Database, DatabaseError};
use crate::models::Note;

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("Collection name is required")]
    EmptyName,
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionEntry<'a> {
    pub name: String,
    pub notes: Vec<&'a Note>,
}

impl CollectionEntry<'_> {
    pub fn note_count(&self) -> usize {
        self.notes.len()
    }
}

/// Server-derived collections first (first-appearance order), then locally
/// stored names that no note references yet.
pub fn collections_view<'a>(notes: &'a [Note], local: &[String]) -> Vec<CollectionEntry<'a>> {
    let mut entries: Vec<CollectionEntry<'a>> = group_by_collection(notes)
        .into_iter()
        .map(|group| CollectionEntry {
            name: group.key,
            notes: group.records,
        })
        .collect();

    for name in local {
        if !entries.iter().any(|e| e.name == *name) {
            entries.push(CollectionEntry {
                name: name.clone(),
                notes: Vec::new(),
            });
        }
    }
    entries
}

/// Notes filed under `name`, in source order.
pub fn collection_notes<'a>(notes: &'a [Note], name: &str) -> Vec<&'a Note> {
    notes
        .iter()
        .filter(|note| note.collection() == Some(name.trim()))
        .collect()
}

/// Store a new, still empty collection locally. Returns the trimmed name.
pub fn create_collection(db: &Database, name: &str) -> Result<String, CollectionError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CollectionError::EmptyName);
    }
    if db.add_empty_collection(name)? {
        info!(collection = name, "created collection");
    } else {
        debug!(collection = name, "collection already stored");
    }
    Ok(name.to_string())
}

/// Remove a collection from the local set. Member notes are left alone, so
/// a collection that still has notes shows up again on the next render.
pub fn delete_collection(db: &Database, name: &str) -> Result<bool, CollectionError> {
    let removed = db.remove_empty_collection(name.trim())?;
    debug!(collection = name, removed, "delete collection");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work_note() -> Note {
        Note {
            title: "Standup".into(),
            notebook: Some("Work".into()),
            ..Note::default()
        }
    }

    fn summary(entries: &[CollectionEntry<'_>]) -> Vec<(String, usize)> {
        entries.iter().map(|e| (e.name.clone(), e.note_count())).collect()
    }

    #[test]
    fn merges_server_and_local_collections() {
        let notes = vec![work_note()];
        let local = vec!["Ideas".to_string()];
        let view = collections_view(&notes, &local);
        assert_eq!(
            summary(&view),
            vec![("Work".to_string(), 1), ("Ideas".to_string(), 0)]
        );
    }

    #[test]
    fn local_name_matching_server_collection_is_not_duplicated() {
        let notes = vec![work_note()];
        let local = vec!["Work".to_string()];
        assert_eq!(collections_view(&notes, &local).len(), 1);
    }

    #[test]
    fn deleting_only_affects_empty_collections() {
        let db = Database::open_in_memory().unwrap();
        create_collection(&db, "Ideas").unwrap();
        create_collection(&db, "Work").unwrap();
        let notes = vec![work_note()];

        assert!(delete_collection(&db, "Ideas").unwrap());
        delete_collection(&db, "Work").unwrap();

        let local = db.empty_collections().unwrap();
        let view = collections_view(&notes, &local);
        assert_eq!(summary(&view), vec![("Work".to_string(), 1)]);
        assert_eq!(notes[0].notebook.as_deref(), Some("Work"));
    }

    #[test]
    fn blank_names_are_rejected() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(create_collection(&db, "   "), Err(CollectionError::EmptyName)));
        assert_eq!(create_collection(&db, "  Ideas ").unwrap(), "Ideas");
    }

    #[test]
    fn collection_notes_match_trimmed_names() {
        let mut other = work_note();
        other.notebook = Some(" Work ".into());
        let notes = vec![work_note(), other, Note::default()];
        assert_eq!(collection_notes(&notes, "Work").len(), 2);
    }
}
