//! RSS 2.0 feed assembly.
//!
//! Pure formatting: a [`ChannelRecord`] and the articles that extracted
//! successfully go in, an XML document comes out. Article bodies are embedded
//! as escaped text in `<description>`, which is how RSS readers expect HTML.

use crate::models::{ArticleRecord, ChannelRecord};
use chrono::{DateTime, NaiveDate, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

/// RFC 822 timestamp in GMT, the form RSS 2.0 uses for dates.
pub fn rfc822(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// A publication date rendered as midnight GMT.
pub fn rfc822_date(date: NaiveDate) -> String {
    date.format("%a, %d %b %Y 00:00:00 GMT").to_string()
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> anyhow::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Build the feed document for `channel` with one item per article.
///
/// `built_at` becomes `<lastBuildDate>`.
pub fn assemble(channel: &ChannelRecord, articles: &[ArticleRecord], built_at: DateTime<Utc>) -> anyhow::Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    writer.write_event(Event::Start(rss))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    text_element(&mut writer, "title", &channel.title)?;
    text_element(&mut writer, "link", &channel.url)?;
    text_element(&mut writer, "description", &channel.description)?;
    if !channel.image_url.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("image")))?;
        text_element(&mut writer, "url", &channel.image_url)?;
        text_element(&mut writer, "title", &channel.title)?;
        text_element(&mut writer, "link", &channel.url)?;
        writer.write_event(Event::End(BytesEnd::new("image")))?;
    }
    text_element(&mut writer, "lastBuildDate", &rfc822(built_at))?;

    for article in articles {
        writer.write_event(Event::Start(BytesStart::new("item")))?;
        text_element(&mut writer, "title", &article.title)?;
        text_element(&mut writer, "link", article.source_url.as_str())?;
        text_element(&mut writer, "description", &article.content_markup)?;
        text_element(&mut writer, "pubDate", &rfc822_date(article.published_date))?;
        text_element(&mut writer, "guid", article.source_url.as_str())?;
        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    Ok(String::from_utf8(writer.into_inner())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CanonicalUrl;
    use chrono::TimeZone;

    fn channel() -> ChannelRecord {
        ChannelRecord {
            url: "https://dzen.ru/tourister?tab=articles".into(),
            title: "Tourister & Co".into(),
            image_url: "https://avatars.dzen.ru/t.jpg".into(),
            description: String::new(),
            article_links: vec![],
        }
    }

    fn article(id: &str, day: u32) -> ArticleRecord {
        ArticleRecord {
            source_url: CanonicalUrl::parse(&format!("https://dzen.ru/a/{id}"), None).unwrap(),
            title: format!("Article {id}"),
            published_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            content_markup: r#"<p>Hi</p><div data-block-type="image"><img src="p.jpg"></div>"#.into(),
        }
    }

    #[test]
    fn test_rfc822_formats() {
        let at = Utc.with_ymd_and_hms(2025, 3, 18, 7, 5, 9).unwrap();
        assert_eq!(rfc822(at), "Tue, 18 Mar 2025 07:05:09 GMT");
        assert_eq!(
            rfc822_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()),
            "Mon, 15 Jan 2024 00:00:00 GMT"
        );
    }

    #[test]
    fn test_feed_structure_and_escaping() {
        let built = Utc.with_ymd_and_hms(2025, 3, 18, 7, 5, 9).unwrap();
        let xml = assemble(&channel(), &[article("A", 15), article("B", 16)], built).unwrap();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="utf-8"?>"#));
        assert!(xml.contains(r#"<rss version="2.0">"#));
        assert!(xml.contains("<title>Tourister &amp; Co</title>"));
        assert!(xml.contains("<url>https://avatars.dzen.ru/t.jpg</url>"));
        assert!(xml.contains("<lastBuildDate>Tue, 18 Mar 2025 07:05:09 GMT</lastBuildDate>"));
        assert!(xml.contains("<guid>https://dzen.ru/a/A</guid>"));
        assert!(xml.contains("<pubDate>Tue, 16 Jan 2024 00:00:00 GMT</pubDate>"));
        assert!(xml.contains("&lt;p&gt;Hi&lt;/p&gt;"));
        assert!(!xml.contains("<p>Hi</p>"));
        assert_eq!(xml.matches("<item>").count(), 2);
        assert!(xml.find("https://dzen.ru/a/A").unwrap() < xml.find("https://dzen.ru/a/B").unwrap());
    }

    #[test]
    fn test_feed_without_articles_is_still_valid() {
        let xml = assemble(&channel(), &[], Utc::now()).unwrap();
        assert!(xml.contains("<channel>"));
        assert!(xml.trim_end().ends_with("</rss>"));
        assert!(!xml.contains("<item>"));
    }
}
