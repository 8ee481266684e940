//! Fixed post lists for origins without a public read API.
//!
//! Timestamps are expressed as an age and resolved against the clock on every
//! fetch, so the posts always look recent.

use std::sync::Arc;

use async_trait::async_trait;
use time::Duration;

use crate::{
    application::{
        clock::Clock,
        sources::{SourceError, SourceProvider},
    },
    domain::posts::{FeedSource, NormalizedPost, truncate_content},
};

struct Fixture {
    local_id: &'static str,
    title: &'static str,
    content: &'static str,
    url: &'static str,
    author: &'static str,
    upvotes: u64,
    hours_ago: i64,
}

const TWITTER: &[Fixture] = &[
    Fixture {
        local_id: "001",
        title: "The future of web development is looking exciting!",
        content: "TypeScript 5.5 just dropped and the performance improvements are insane. \
                  Incremental builds are now 50% faster. #webdev #typescript",
        url: "https://twitter.com/i/web/status/001",
        author: "@typescript",
        upvotes: 4_821,
        hours_ago: 2,
    },
    Fixture {
        local_id: "002",
        title: "React 19 stable is here",
        content: "React 19 is now stable! Server Components, Actions, and tons of new hooks. \
                  Time to upgrade your projects. Full blog post: react.dev/blog",
        url: "https://twitter.com/i/web/status/002",
        author: "@reactjs",
        upvotes: 12_300,
        hours_ago: 4,
    },
    Fixture {
        local_id: "003",
        title: "AI-assisted coding is changing developer workflows",
        content: "Survey results: 72% of developers now use AI tools daily. \
                  Here's how it's reshaping how we build software. Thread below.",
        url: "https://twitter.com/i/web/status/003",
        author: "@github",
        upvotes: 6_700,
        hours_ago: 6,
    },
    Fixture {
        local_id: "004",
        title: "Node.js 22 LTS: what you need to know",
        content: "Node.js 22 LTS released with native fetch, better ESM support, and improved \
                  diagnostics. Upgrade guide: nodejs.org/en/blog",
        url: "https://twitter.com/i/web/status/004",
        author: "@nodejs",
        upvotes: 3_400,
        hours_ago: 8,
    },
    Fixture {
        local_id: "005",
        title: "Open-source spotlight: Best repos this week",
        content: "Curated list of the most exciting open-source repos trending this week. \
                  From UI libraries to DevOps tools. #opensource",
        url: "https://twitter.com/i/web/status/005",
        author: "@github_trending",
        upvotes: 2_150,
        hours_ago: 10,
    },
];

const LINKEDIN: &[Fixture] = &[
    Fixture {
        local_id: "001",
        title: "10 lessons learned from building a SaaS to $1M ARR",
        content: "After 3 years of building in public, here are the most important lessons \
                  I've learned about product, growth, and team building...",
        url: "https://linkedin.com/posts/li_001",
        author: "Patrick Campbell",
        upvotes: 8_932,
        hours_ago: 1,
    },
    Fixture {
        local_id: "002",
        title: "Why senior engineers think differently",
        content: "It's not about writing more code. Senior engineers focus on reducing \
                  complexity, improving team velocity, and making decisions that age well...",
        url: "https://linkedin.com/posts/li_002",
        author: "Gergely Orosz",
        upvotes: 14_200,
        hours_ago: 3,
    },
    Fixture {
        local_id: "003",
        title: "The hidden cost of technical debt",
        content: "We estimated our technical debt was costing us 30% of engineering velocity. \
                  Here's how we quantified it and built a plan to pay it down systematically...",
        url: "https://linkedin.com/posts/li_003",
        author: "Charity Majors",
        upvotes: 5_600,
        hours_ago: 5,
    },
    Fixture {
        local_id: "004",
        title: "Remote work best practices for distributed teams in 2024",
        content: "After managing distributed teams across 4 time zones, here are the \
                  communication and collaboration practices that actually work...",
        url: "https://linkedin.com/posts/li_004",
        author: "Sid Sijbrandij",
        upvotes: 4_100,
        hours_ago: 7,
    },
];

pub struct CuratedSource {
    source: FeedSource,
    fixtures: &'static [Fixture],
    clock: Arc<dyn Clock>,
    content_limit: usize,
}

impl CuratedSource {
    pub fn twitter(clock: Arc<dyn Clock>, content_limit: usize) -> Self {
        Self {
            source: FeedSource::Twitter,
            fixtures: TWITTER,
            clock,
            content_limit,
        }
    }

    pub fn linkedin(clock: Arc<dyn Clock>, content_limit: usize) -> Self {
        Self {
            source: FeedSource::Linkedin,
            fixtures: LINKEDIN,
            clock,
            content_limit,
        }
    }
}

#[async_trait]
impl SourceProvider for CuratedSource {
    fn source(&self) -> FeedSource {
        self.source
    }

    async fn fetch_latest(&self) -> Result<Vec<NormalizedPost>, SourceError> {
        let now = self.clock.now_utc();
        Ok(self
            .fixtures
            .iter()
            .map(|fixture| NormalizedPost {
                id: self.source.namespaced_id(fixture.local_id),
                title: fixture.title.to_string(),
                content: truncate_content(fixture.content, self.content_limit),
                source: self.source,
                url: fixture.url.to_string(),
                author: Some(fixture.author.to_string()),
                thumbnail: None,
                upvotes: fixture.upvotes,
                published_at: now - Duration::hours(fixture.hours_ago),
            })
            .collect())
    }
}
