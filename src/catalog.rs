//! Defines the [`Catalog`], one immutable generation of parsed posts, and the
//! [`Diagnostic`]s explaining what a build left out.

use crate::locator;
use crate::post::{Error as PostError, Post};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// A recorded, non-fatal failure: why a post or a directory is missing from
/// the catalog.
#[derive(Debug)]
pub struct Diagnostic {
    /// The post file or directory that was excluded.
    pub path: PathBuf,
    pub kind: DiagnosticKind,
}

#[derive(Debug)]
pub enum DiagnosticKind {
    /// A year or month directory couldn't be listed; its posts are missing.
    UnreadableBranch(io::Error),

    /// A post file couldn't be read or parsed.
    Post(PostError),

    /// Another post, at `kept`, already has this post's canonical URL.
    DuplicateUrl { url: String, kept: PathBuf },
}

impl fmt::Display for Diagnostic {
    /// Displays a [`Diagnostic`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::UnreadableBranch(err) => write!(
                f,
                "skipped directory '{}': {}",
                self.path.display(),
                err
            ),
            DiagnosticKind::Post(err) => {
                write!(f, "skipped post '{}': {}", self.path.display(), err)
            }
            DiagnosticKind::DuplicateUrl { url, kept } => write!(
                f,
                "skipped post '{}': url {} already belongs to '{}'",
                self.path.display(),
                url,
                kept.display()
            ),
        }
    }
}

/// Orders posts by date, most recent first, breaking ties by ascending
/// source path. The result doesn't depend on the input order.
pub fn sort_posts(posts: impl IntoIterator<Item = Post>) -> Vec<Post> {
    let mut posts: Vec<Post> = posts.into_iter().collect();
    posts.sort_by(|a, b| {
        b.date
            .sort_key()
            .cmp(&a.date.sort_key())
            .then_with(|| a.source_path.cmp(&b.source_path))
    });
    posts
}

/// One complete build generation: the sorted posts, an index from canonical
/// URL to post, and the diagnostics recorded while building it.
#[derive(Debug, Default)]
pub struct Catalog {
    posts: Vec<Arc<Post>>,
    by_url: HashMap<String, usize>,
    diagnostics: Vec<Diagnostic>,
}

impl Catalog {
    /// Assembles a catalog from posts in any order. When two posts share a
    /// canonical URL, the one with the lesser source path keeps it and the
    /// other is dropped with a [`DiagnosticKind::DuplicateUrl`] diagnostic.
    pub fn new(
        posts: impl IntoIterator<Item = Post>,
        mut diagnostics: Vec<Diagnostic>,
    ) -> Catalog {
        let mut posts: Vec<Post> = posts.into_iter().collect();
        posts.sort_by(|a, b| a.source_path.cmp(&b.source_path));

        let mut claimed: HashMap<String, PathBuf> = HashMap::new();
        let mut unique = Vec::with_capacity(posts.len());
        for post in posts {
            match claimed.get(&post.url) {
                Some(kept) => diagnostics.push(Diagnostic {
                    kind: DiagnosticKind::DuplicateUrl {
                        url: post.url.clone(),
                        kept: kept.clone(),
                    },
                    path: post.source_path,
                }),
                None => {
                    claimed.insert(post.url.clone(), post.source_path.clone());
                    unique.push(post);
                }
            }
        }

        let posts: Vec<Arc<Post>> = sort_posts(unique).into_iter().map(Arc::new).collect();
        let by_url = posts
            .iter()
            .enumerate()
            .map(|(i, post)| (post.url.clone(), i))
            .collect();
        diagnostics.sort_by(|a, b| a.path.cmp(&b.path));
        Catalog {
            posts,
            by_url,
            diagnostics,
        }
    }

    /// The posts, most recent first.
    pub fn posts(&self) -> &[Arc<Post>] {
        &self.posts
    }

    /// Looks up a post by its exact canonical URL.
    pub fn get(&self, url: &str) -> Option<&Arc<Post>> {
        self.by_url.get(url).map(|&i| &self.posts[i])
    }

    /// Finds a post by canonical URL or by any variant accepted by
    /// [`locator::normalize_query`]. A miss is retried with `extension`
    /// stripped from the end of the slug.
    pub fn find(&self, query: &str, extension: &str) -> Option<&Arc<Post>> {
        let url = locator::normalize_query(query)?;
        self.get(&url).or_else(|| {
            url.strip_suffix(extension)
                .and_then(|url| self.get(url))
        })
    }

    /// Returns the posts immediately newer and older than the post at `url`.
    pub fn neighbors(&self, url: &str) -> (Option<&Arc<Post>>, Option<&Arc<Post>>) {
        match self.by_url.get(url) {
            None => (None, None),
            Some(&i) => (
                i.checked_sub(1).and_then(|newer| self.posts.get(newer)),
                self.posts.get(i + 1),
            ),
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::PostFormat;
    use std::path::Path;

    fn post(path: &str, date: &str) -> Post {
        let input = format!("---\nTitle: {}\nDate: {}\nExcerpt: x\n---\n", path, date);
        Post::parse(Path::new(path), input.as_bytes(), &PostFormat::default()).unwrap()
    }

    fn paths(posts: &[Arc<Post>]) -> Vec<&Path> {
        posts.iter().map(|p| p.source_path.as_path()).collect()
    }

    #[test]
    fn test_sort_newest_first() {
        let sorted = sort_posts(vec![
            post("posts/2019/12/old.md", "2019-12-31"),
            post("posts/2020/03/new.md", "2020-03-01"),
        ]);
        assert_eq!("2020-03-01", sorted[0].raw_date);
        assert_eq!("2019-12-31", sorted[1].raw_date);
    }

    #[test]
    fn test_sort_ties_by_path() {
        let input = vec![
            post("posts/2019/01/c.md", "2019-01-05"),
            post("posts/2019/01/a.md", "2019-01-05"),
            post("posts/2019/01/b.md", "2019-01-05"),
        ];
        let mut reversed = input.clone();
        reversed.reverse();

        let sorted = sort_posts(input);
        assert_eq!(sorted, sort_posts(reversed));
        let names: Vec<&str> = sorted.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(vec!["a", "b", "c"], names);
    }

    #[test]
    fn test_sort_unpadded_dates_numerically() {
        let sorted = sort_posts(vec![
            post("posts/2019/09/sept.md", "2019-9-30"),
            post("posts/2019/10/oct.md", "2019-10-1"),
        ]);
        assert_eq!("oct", sorted[0].slug);
    }

    #[test]
    fn test_catalog_index_and_neighbors() {
        let catalog = Catalog::new(
            vec![
                post("posts/2019/01/b.md", "2019-01-02"),
                post("posts/2019/01/c.md", "2019-01-03"),
                post("posts/2019/01/a.md", "2019-01-01"),
            ],
            Vec::new(),
        );
        assert_eq!(3, catalog.len());
        assert_eq!(
            Path::new("posts/2019/01/b.md"),
            catalog.get("/posts/2019/01/b").unwrap().source_path
        );
        assert!(catalog.get("/posts/2019/01/missing").is_none());

        let (newer, older) = catalog.neighbors("/posts/2019/01/b");
        assert_eq!("c", newer.unwrap().slug);
        assert_eq!("a", older.unwrap().slug);

        let (newer, older) = catalog.neighbors("/posts/2019/01/c");
        assert!(newer.is_none());
        assert_eq!("b", older.unwrap().slug);
    }

    #[test]
    fn test_catalog_find() {
        let catalog = Catalog::new(
            vec![
                post("posts/2019/01/a.md", "2019-01-01"),
                post("posts/2019/01/notes.md.md", "2019-01-02"),
            ],
            Vec::new(),
        );
        for query in &["/posts/2019/01/a", "2019/01/a/", "posts/2019/01/a.md"] {
            assert_eq!("a", catalog.find(query, ".md").unwrap().slug, "{}", query);
        }
        // an exact match wins over the stripped extension
        assert_eq!(
            "notes.md",
            catalog.find("/posts/2019/01/notes.md", ".md").unwrap().slug
        );
        assert!(catalog.find("/posts/2019/01/b", ".md").is_none());
        assert!(catalog.find("/about", ".md").is_none());
    }

    #[test]
    fn test_catalog_duplicate_url() {
        // both dated January 2019, so both claim /posts/2019/01/a
        let catalog = Catalog::new(
            vec![
                post("posts/2020/05/a.md", "2019-01-02"),
                post("posts/2019/01/a.md", "2019-01-01"),
            ],
            Vec::new(),
        );
        assert_eq!(vec![Path::new("posts/2019/01/a.md")], paths(catalog.posts()));
        assert_eq!(1, catalog.diagnostics().len());
        let diagnostic = &catalog.diagnostics()[0];
        assert_eq!(Path::new("posts/2020/05/a.md"), diagnostic.path);
        match &diagnostic.kind {
            DiagnosticKind::DuplicateUrl { url, kept } => {
                assert_eq!("/posts/2019/01/a", url);
                assert_eq!(Path::new("posts/2019/01/a.md"), kept.as_path());
            }
            other => panic!("unexpected diagnostic {:?}", other),
        }
    }
}
