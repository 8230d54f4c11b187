use crate::server::templates::ToHtml;
use pulldown_cmark::{html::push_html, Event, HeadingLevel, Parser, Tag, TagEnd};

/// Render user-written markdown to html.
///
/// Raw html in the source is escaped, and headings are pushed down so
/// that the highest level used is `h3`, below the page and post headings.
pub fn safe_md2html(raw: &str) -> String {
    let below_level = lh(HeadingLevel::H3);
    let mut hdiff = 0;
    let markdown = Parser::new(raw).map(|e| match e {
        Event::Html(s) | Event::InlineHtml(s) => Event::Text(s),
        Event::Start(Tag::Heading {
            level,
            id,
            classes,
            attrs,
        }) => {
            let level = lh(level);
            hdiff = std::cmp::max(hdiff, below_level - level);
            Event::Start(Tag::Heading {
                level: hl(level + hdiff),
                id,
                classes,
                attrs,
            })
        }
        Event::End(TagEnd::Heading(level)) => {
            Event::End(TagEnd::Heading(hl(lh(level) + hdiff)))
        }
        e => e,
    });
    let mut html = String::new();
    push_html(&mut html, markdown);
    html
}

/// Markdown text to be rendered in a template.
pub struct Markdown<'a>(pub &'a str);

impl ToHtml for Markdown<'_> {
    fn to_html(&self, out: &mut dyn std::io::Write) -> std::io::Result<()> {
        out.write_all(safe_md2html(self.0).as_bytes())
    }
}

fn lh(h: HeadingLevel) -> i8 {
    match h {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
fn hl(i: i8) -> HeadingLevel {
    match i {
        i if i <= 1 => HeadingLevel::H1,
        2 => HeadingLevel::H2,
        3 => HeadingLevel::H3,
        4 => HeadingLevel::H4,
        5 => HeadingLevel::H5,
        _ => HeadingLevel::H6,
    }
}

#[test]
fn markdown_no_html() {
    assert_eq!(
        safe_md2html(
            "Nice trip!\
             \r\n\r\nI <em>really</em> liked _the_ pictures.\
             \r\n\r\n<script>evil</script>"
        ),
        "<p>Nice trip!</p>\
         \n<p>I &lt;em&gt;really&lt;/em&gt; liked <em>the</em> pictures.</p>\
         \n&lt;script&gt;evil&lt;/script&gt;",
    );
}

#[test]
fn heading_level() {
    assert_eq!(
        safe_md2html(
            "# Day one\
             \r\n\r\nWe left early.\
             \r\n\r\n## Lunch\
             \r\n\r\nSoup."
        ),
        "<h3>Day one</h3>\
         \n<p>We left early.</p>\
         \n<h4>Lunch</h4>\
         \n<p>Soup.</p>\n",
    );
}

#[test]
fn markdown_to_html_wrapper() {
    let mut out = Vec::new();
    Markdown("*hi* <b>").to_html(&mut out).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "<p><em>hi</em> &lt;b&gt;</p>\n"
    );
}
