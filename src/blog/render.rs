//! Markup for the blog pages. Every function here is pure: callers pass in
//! whatever state (view counts, comments, reactions) should be shown.

use maud::{html, Markup, PreEscaped};

use super::engagement::{Comment, Reactions};
use crate::{generator::markdown, metadata::Post};

fn display_date(post: &Post, format: &str) -> String {
    post.date_value()
        .map_or_else(|| post.date.clone(), |d| d.format(format).to_string())
}

fn image_or_placeholder(post: &Post, size: &str) -> String {
    post.first_image().map_or_else(
        || format!("https://picsum.photos/seed/{}/{size}.jpg", post.file),
        str::to_string,
    )
}

fn post_href(post: &Post) -> String {
    format!("post.html?post={}", post.file)
}

fn tags(tags: &[String]) -> Markup {
    html! {
        @for tag in tags {
            span.tag { (tag) }
        }
    }
}

pub(crate) fn post_card(post: &Post, views: u64) -> Markup {
    html! {
        div.post-card {
            img.post-card-image.lazy-image src=(image_or_placeholder(post, "400/200")) alt=(post.title);
            div.post-card-content {
                h3.post-card-title { (post.title) }
                div.post-card-meta {
                    span.post-date { (display_date(post, "%B %-d, %Y")) }
                    span.post-views { (views) " views" }
                }
                div.post-card-tags { (tags(&post.tags)) }
                p.post-card-excerpt { (post.excerpt) }
                a.read-more href=(post_href(post)) { "Read More" }
            }
        }
    }
}

/// Cards for `posts`, with `views` looked up per post file.
pub(crate) fn post_list(posts: &[&Post], views: impl Fn(&Post) -> u64) -> String {
    if posts.is_empty() {
        return html! { div.no-posts { "No posts found." } }.into_string();
    }
    html! {
        @for post in posts {
            (post_card(post, views(*post)))
        }
    }
    .into_string()
}

fn post_body(post: &Post, views: Option<u64>) -> Markup {
    html! {
        div.post-header {
            h1.post-title { (post.title) }
            div.post-meta {
                span.post-date { (display_date(post, "%B %-d, %Y")) }
                @if let Some(views) = views {
                    span.post-views { (views) " views" }
                }
            }
            div.post-tags { (tags(&post.tags)) }
        }
        div.post-content {
            (PreEscaped(markdown::render(&post.content)))
        }
    }
}

pub(crate) fn post_page(post: &Post, views: u64) -> String {
    post_body(post, Some(views)).into_string()
}

/// A post that is not published yet.
pub(crate) fn post_preview(post: &Post) -> String {
    html! {
        div.post-preview { (post_body(post, None)) }
    }
    .into_string()
}

pub(crate) fn recent_posts(posts: &[&Post]) -> String {
    html! {
        @for post in posts {
            li { a href=(post_href(post)) { (post.title) } }
        }
    }
    .into_string()
}

pub(crate) fn related_posts(posts: &[&Post]) -> String {
    if posts.is_empty() {
        return html! { p { "No related posts found." } }.into_string();
    }
    html! {
        @for post in posts {
            div.related-post {
                img.related-post-image src=(image_or_placeholder(post, "80/80")) alt=(post.title);
                div.related-post-content {
                    h4 { a href=(post_href(post)) { (post.title) } }
                    div.related-post-meta { (display_date(post, "%b %-d, %Y")) }
                }
            }
        }
    }
    .into_string()
}

pub(crate) fn tag_cloud(cloud: &[(String, usize)]) -> String {
    html! {
        @for (tag, count) in cloud {
            span.tag { (tag) " (" (count) ")" }
        }
    }
    .into_string()
}

pub(crate) fn comments(comments: &[Comment]) -> String {
    if comments.is_empty() {
        return html! { p { "No comments yet. Be the first to comment!" } }.into_string();
    }
    html! {
        @for comment in comments {
            div.comment {
                div.comment-header {
                    span.comment-author { (comment.name) }
                    span.comment-date { (comment.date) }
                }
                div.comment-text { (comment.text) }
            }
        }
    }
    .into_string()
}

pub(crate) fn reaction_bar(reactions: &Reactions) -> String {
    html! {
        div.reactions {
            @for (reaction, count) in &reactions.counts {
                button.reaction-btn.active[reactions.mine.as_deref() == Some(reaction.as_str())]
                    data-reaction=(reaction) {
                    (reaction) " " span.count { (count) }
                }
            }
        }
    }
    .into_string()
}
