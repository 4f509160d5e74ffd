use super::SecondaryEntry;

/// Lookup structure over one inventory snapshot.
///
/// Only entries that carry a TMDb id are indexed, since nothing else is
/// useful for resolution.
#[derive(Debug, Clone, Default)]
pub struct SecondaryIndex {
    entries: Vec<SecondaryEntry>,
}

impl SecondaryIndex {
    pub fn new(entries: Vec<SecondaryEntry>) -> Self {
        Self {
            entries: entries.into_iter().filter(|e| e.tmdb_id.is_some()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Match by title and year.
    ///
    /// Tried in order: exact title (any known name) with the same year,
    /// substring title with the same year, substring title within one year.
    /// Without a year only an exact title match is accepted.
    pub fn find_by_title_year(&self, title: &str, year: Option<i32>) -> Option<&SecondaryEntry> {
        let query = title.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }

        let exact = |e: &SecondaryEntry| e.titles().any(|t| t.to_lowercase() == query);
        let partial = |e: &SecondaryEntry| e.titles().any(|t| t.to_lowercase().contains(&query));

        let Some(year) = year else {
            return self.entries.iter().find(|&e| exact(e));
        };

        self.entries
            .iter()
            .find(|&e| e.year == Some(year) && exact(e))
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|&e| e.year == Some(year) && partial(e))
            })
            .or_else(|| {
                self.entries.iter().find(|&e| {
                    e.year.is_some_and(|y| (y - year).abs() <= 1) && partial(e)
                })
            })
    }

    /// Match by TheTVDB id.
    pub fn find_by_tvdb(&self, tvdb_id: &str) -> Option<&SecondaryEntry> {
        let id: u64 = tvdb_id.trim().parse().ok()?;
        self.entries.iter().find(|e| e.tvdb_id == Some(id))
    }

    /// Match by IMDb id, with or without the "tt" prefix.
    pub fn find_by_imdb(&self, imdb_id: &str) -> Option<&SecondaryEntry> {
        let wanted = normalize_imdb(imdb_id)?;
        self.entries
            .iter()
            .find(|e| e.imdb_id.as_deref().and_then(normalize_imdb).as_deref() == Some(wanted.as_str()))
    }

    /// Match a media file against entry folders and tracked files.
    pub fn find_by_path(&self, file_path: &str) -> Option<&SecondaryEntry> {
        let file = file_path.to_lowercase();
        if file.is_empty() {
            return None;
        }

        self.entries.iter().find(|e| {
            let in_folder = e
                .path
                .as_deref()
                .is_some_and(|folder| path_within(&file, &folder.to_lowercase()));
            let same_file = e
                .file_path
                .as_deref()
                .is_some_and(|tracked| !tracked.is_empty() && file.ends_with(&tracked.to_lowercase()));
            in_folder || same_file
        })
    }
}

fn normalize_imdb(id: &str) -> Option<String> {
    let id = id.trim().to_lowercase();
    if id.is_empty() {
        return None;
    }
    Some(if id.starts_with("tt") {
        id
    } else {
        format!("tt{}", id)
    })
}

/// Whether `folder` appears in `file` as a whole directory component run.
/// Mount prefixes may differ between services, so the folder can sit
/// anywhere in the file path.
fn path_within(file: &str, folder: &str) -> bool {
    let folder = folder.trim_end_matches(['/', '\\']);
    if folder.is_empty() {
        return false;
    }

    file.match_indices(folder).any(|(start, _)| {
        let before_ok = start == 0
            || folder.starts_with(['/', '\\'])
            || file[..start].ends_with(['/', '\\']);
        let after = &file[start + folder.len()..];
        before_ok && (after.is_empty() || after.starts_with(['/', '\\']))
    })
}
