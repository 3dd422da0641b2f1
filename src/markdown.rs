use pulldown_cmark::{html, Event, Options, Parser, Tag};

/// The number of levels post headings are demoted by. Post pages render the
/// site title as `h1` and the post title as `h2`, so a `#` heading in a post
/// body becomes `h3`.
const HEADING_OFFSET: u32 = 2;

/// Converts a post body from markdown to HTML.
pub fn to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(
        &mut output,
        Parser::new_ext(markdown, options).map(demote_heading),
    );
    output
}

fn demote_heading(ev: Event) -> Event {
    match ev {
        Event::Start(Tag::Heading(level)) => {
            Event::Start(Tag::Heading((level + HEADING_OFFSET).min(6)))
        }
        Event::End(Tag::Heading(level)) => {
            Event::End(Tag::Heading((level + HEADING_OFFSET).min(6)))
        }
        _ => ev,
    }
}
