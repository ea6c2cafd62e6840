use std::path::PathBuf;

use anyhow::{bail, Context as _};
use blog::{
    admin::{self, Draft, PostTemplate, Settings},
    engagement, listing, render,
    source::{self, DirSource, PostSource},
};
use chrono::Utc;
use clap::{command, value_parser, Arg, ArgAction, ArgMatches, Command};
use context::Context;
use log::info;
use store::JsonFileStore;

mod blog;
mod context;
mod frontmatter;
mod generator;
mod metadata;
mod store;

fn file_arg() -> Arg {
    Arg::new("file")
        .help("Post file name as listed in posts.json")
        .required(true)
}

fn store_args() -> [Arg; 2] {
    [
        Arg::new("posts_dir")
            .long("posts-dir")
            .help("Directory holding posts.json and the post files")
            .value_parser(value_parser!(PathBuf))
            .default_value("posts"),
        Arg::new("state")
            .long("state")
            .help("JSON file keeping views, comments, reactions, drafts and settings")
            .value_parser(value_parser!(PathBuf))
            .default_value("state.json"),
    ]
}

fn draft_args() -> [Arg; 4] {
    [
        Arg::new("title").long("title").required(true),
        Arg::new("date").long("date").required(true),
        Arg::new("tags").long("tags").help("Comma separated"),
        Arg::new("content").long("content").required(true),
    ]
}

fn out_dir_arg(help: &'static str) -> Arg {
    Arg::new("out")
        .long("out")
        .help(help)
        .value_parser(value_parser!(PathBuf))
}

fn json_flag() -> Arg {
    Arg::new("json")
        .long("json")
        .help("Print JSON instead of text")
        .action(ArgAction::SetTrue)
}

fn cli() -> Command {
    command!()
        .subcommand_required(true)
        .subcommand(
            Command::new("build")
                .about("Build the static site from a tree of markdown pages")
                .args([
                    Arg::new("src")
                        .long("src")
                        .help("Source directory with pages/ and optionally assets/ and images/")
                        .value_parser(value_parser!(PathBuf))
                        .default_value("src"),
                    Arg::new("out")
                        .long("out")
                        .help("Directory path of output. Existing contents will be removed.")
                        .value_parser(value_parser!(PathBuf))
                        .default_value("dist"),
                    Arg::new("template")
                        .long("template")
                        .help("Layout template")
                        .value_parser(value_parser!(PathBuf))
                        .default_value("templates/layout.html"),
                    Arg::new("base_url")
                        .long("base-url")
                        .help("Absolute site URL used in sitemap.xml. Falls back to BLOG_URL."),
                    Arg::new("search_index")
                        .long("search-index")
                        .help("Write assets/js/search-index.json")
                        .action(ArgAction::SetTrue),
                    Arg::new("sitemap")
                        .long("sitemap")
                        .help("Write sitemap.xml")
                        .action(ArgAction::SetTrue),
                ]),
        )
        .subcommand(
            Command::new("search")
                .about("Query the search index of a built site")
                .arg(
                    Arg::new("out")
                        .long("out")
                        .help("Output directory of the build")
                        .value_parser(value_parser!(PathBuf))
                        .default_value("dist"),
                )
                .arg(Arg::new("term").required(true)),
        )
        .subcommand(
            Command::new("posts")
                .about("Read the published posts")
                .args(store_args())
                .subcommand_required(true)
                .subcommand(
                    Command::new("list")
                        .about("List all posts")
                        .arg(json_flag())
                        .arg(Arg::new("tag").long("tag").help("Only posts tagged with this")),
                )
                .subcommand(
                    Command::new("show")
                        .about("Render one post as HTML and count the view")
                        .arg(file_arg())
                        .arg(
                            Arg::new("raw")
                                .long("raw")
                                .help("Print normalized markdown instead")
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(
                    Command::new("meta")
                        .about("Print every frontmatter field of a post")
                        .arg(file_arg()),
                )
                .subcommand(
                    Command::new("search")
                        .about("Search titles, tags and bodies")
                        .arg(Arg::new("term").required(true)),
                )
                .subcommand(Command::new("tags").about("Tag usage counts").arg(json_flag()))
                .subcommand(
                    Command::new("related")
                        .about("Posts sharing tags with a post")
                        .arg(file_arg()),
                )
                .subcommand(Command::new("recent").about("Newest posts"))
                .subcommand(Command::new("render").about("Render the post list as HTML cards")),
        )
        .subcommand(
            Command::new("engage")
                .about("Views, comments and reactions")
                .args(store_args())
                .subcommand_required(true)
                .subcommand(
                    Command::new("comment")
                        .about("Add a comment to a post")
                        .arg(file_arg())
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("text").long("text").required(true)),
                )
                .subcommand(
                    Command::new("comments")
                        .about("Render the comments of a post")
                        .arg(file_arg()),
                )
                .subcommand(
                    Command::new("react")
                        .about("React to a post")
                        .arg(file_arg())
                        .arg(Arg::new("reaction").required(true)),
                )
                .subcommand(
                    Command::new("reactions")
                        .about("Render the reaction bar of a post")
                        .arg(file_arg()),
                ),
        )
        .subcommand(
            Command::new("admin")
                .about("Drafts, activity and settings")
                .args(store_args())
                .subcommand_required(true)
                .subcommand(Command::new("stats").about("Dashboard numbers").arg(json_flag()))
                .subcommand(Command::new("activity").about("Recent admin activity"))
                .subcommand(
                    Command::new("posts")
                        .about("Published posts whose title or tags match")
                        .arg(Arg::new("term").help("Matches all posts when left out")),
                )
                .subcommand(
                    Command::new("template")
                        .about("Print a post template dated today")
                        .arg(
                            Arg::new("name")
                                .required(true)
                                .value_parser(PostTemplate::NAMES),
                        ),
                )
                .subcommand(
                    Command::new("draft")
                        .about("Save a new post as a draft")
                        .args(draft_args())
                        .arg(out_dir_arg("Also write the markdown file into this directory")),
                )
                .subcommand(
                    Command::new("preview")
                        .about("Render a draft as it would be published")
                        .args(draft_args()),
                )
                .subcommand(
                    Command::new("export")
                        .about("Export a published post, or posts.json when no file is given")
                        .arg(Arg::new("file").help("Post file name as listed in posts.json"))
                        .arg(out_dir_arg("Write into this directory instead of printing")),
                )
                .subcommand(Command::new("drafts").about("List saved drafts"))
                .subcommand(
                    Command::new("edit")
                        .about("Open a published post for editing, or show which one is open")
                        .arg(Arg::new("file").help("Post file name as listed in posts.json")),
                )
                .subcommand(
                    Command::new("delete")
                        .about("Mark a post for deletion")
                        .arg(file_arg()),
                )
                .subcommand(
                    Command::new("settings")
                        .about("Show or change blog settings")
                        .arg(Arg::new("primary_color").long("primary-color"))
                        .arg(Arg::new("secondary_color").long("secondary-color"))
                        .arg(Arg::new("banner_image").long("banner-image"))
                        .arg(Arg::new("blog_title").long("blog-title")),
                ),
        )
}

fn get_path<'a>(matches: &'a ArgMatches, id: &str) -> anyhow::Result<&'a PathBuf> {
    matches
        .get_one::<PathBuf>(id)
        .with_context(|| format!("missing argument: {id}"))
}

fn get_str<'a>(matches: &'a ArgMatches, id: &str) -> anyhow::Result<&'a str> {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .with_context(|| format!("missing argument: {id}"))
}

fn run_build(matches: &ArgMatches) -> anyhow::Result<()> {
    let source_dir = get_path(matches, "src")?;
    if !source_dir.join("pages").is_dir() {
        bail!("{source_dir:?} must contain a pages directory.");
    }
    let out_dir = get_path(matches, "out")?;
    if out_dir.exists() && !out_dir.is_dir() {
        bail!("if out exists, it must be directory.");
    }
    let template_path = get_path(matches, "template")?;
    if !template_path.is_file() {
        bail!("template must be a file.");
    }

    let base_url = matches
        .get_one::<String>("base_url")
        .cloned()
        .or_else(|| std::env::var("BLOG_URL").ok());

    let ctx = Context {
        source_dir: source_dir.to_owned(),
        out_dir: out_dir.to_owned(),
        template_path: template_path.to_owned(),
        base_url,
        search_index: matches.get_flag("search_index"),
        sitemap: matches.get_flag("sitemap"),
    };
    let report = generator::generate(&ctx)?;
    info!("{report:?}");
    println!("Build completed! {} pages", report.pages);
    Ok(())
}

fn run_search(matches: &ArgMatches) -> anyhow::Result<()> {
    let entries = generator::search::load_search_index(get_path(matches, "out")?)?;
    println!("{}", generator::search::render_results(&entries, get_str(matches, "term")?));
    Ok(())
}

fn open_store(matches: &ArgMatches) -> anyhow::Result<(DirSource, JsonFileStore)> {
    let posts_dir = get_path(matches, "posts_dir")?;
    if !posts_dir.is_dir() {
        bail!("posts-dir must be a directory.");
    }
    let store = JsonFileStore::load(get_path(matches, "state")?)?;
    Ok((DirSource::new(posts_dir), store))
}

fn run_posts(matches: &ArgMatches) -> anyhow::Result<()> {
    let (source, mut store) = open_store(matches)?;
    let posts = source::load_posts(&source)?;
    let views = |post: &metadata::Post| engagement::views(&store, &post.file);

    match matches.subcommand() {
        Some(("list", sub)) => {
            let posts = match sub.get_one::<String>("tag") {
                Some(tag) => listing::filter_by_tag(&posts, tag),
                None => posts.iter().collect(),
            };
            if sub.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&posts)?);
            } else {
                for post in posts {
                    println!("{}  {}  [{}]  ({})", post.date, post.title, post.tags.join(", "), post.file);
                }
            }
        }
        Some(("show", sub)) => {
            let post = source::load_post(&source, get_str(sub, "file")?)?;
            if sub.get_flag("raw") {
                print!("{}", post.to_markdown());
            } else {
                let views = engagement::record_view(&mut store, &post.file);
                println!("{}", render::post_page(&post, views));
            }
        }
        Some(("meta", sub)) => {
            let post = source::load_post(&source, get_str(sub, "file")?)?;
            for (key, value) in post.frontmatter.fields() {
                println!("{key}: {value}");
            }
        }
        Some(("search", sub)) => {
            let found = listing::search(&posts, get_str(sub, "term")?);
            println!("{}", render::post_list(&found, views));
        }
        Some(("tags", sub)) => {
            let cloud = listing::tag_cloud(&posts);
            if sub.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&cloud)?);
            } else {
                println!("{}", render::tag_cloud(&cloud));
            }
        }
        Some(("related", sub)) => {
            let post = source::load_post(&source, get_str(sub, "file")?)?;
            println!("{}", render::related_posts(&listing::related(&posts, &post)));
        }
        Some(("recent", _)) => {
            println!("{}", render::recent_posts(&listing::recent(&posts, listing::RECENT_LIMIT)));
        }
        Some(("render", _)) => {
            let all: Vec<_> = posts.iter().collect();
            println!("{}", render::post_list(&all, views));
        }
        _ => unreachable!("subcommand_required"),
    }

    store.save()
}

fn run_engage(matches: &ArgMatches) -> anyhow::Result<()> {
    let (_, mut store) = open_store(matches)?;

    match matches.subcommand() {
        Some(("comment", sub)) => {
            let file = get_str(sub, "file")?;
            let comments = engagement::add_comment(
                &mut store,
                file,
                get_str(sub, "name")?,
                get_str(sub, "text")?,
                Utc::now(),
            )?;
            println!("{} comments on {file}", comments.len());
        }
        Some(("comments", sub)) => {
            let comments = engagement::comments(&store, get_str(sub, "file")?);
            println!("{}", render::comments(&comments));
        }
        Some(("react", sub)) => {
            let reactions = engagement::react(&mut store, get_str(sub, "file")?, get_str(sub, "reaction")?)?;
            println!("{}", render::reaction_bar(&reactions));
        }
        Some(("reactions", sub)) => {
            let reactions = engagement::reactions(&store, get_str(sub, "file")?);
            println!("{}", render::reaction_bar(&reactions));
        }
        _ => unreachable!("subcommand_required"),
    }

    store.save()
}

fn draft_from(matches: &ArgMatches) -> anyhow::Result<Draft> {
    Ok(Draft::new(
        get_str(matches, "title")?,
        get_str(matches, "date")?,
        matches.get_one::<String>("tags").map_or("", String::as_str),
        get_str(matches, "content")?,
    ))
}

fn run_admin(matches: &ArgMatches) -> anyhow::Result<()> {
    let (source, mut store) = open_store(matches)?;
    let now = Utc::now();

    match matches.subcommand() {
        Some(("stats", sub)) => {
            let stats = admin::dashboard_stats(&store, &source.manifest()?);
            if sub.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("posts: {}", stats.total_posts);
                println!("views: {}", stats.total_views);
                println!("comments: {}", stats.total_comments);
            }
        }
        Some(("activity", _)) => {
            let activities = admin::recent_activity(&store, admin::RECENT_ACTIVITY_LIMIT);
            if activities.is_empty() {
                println!("No recent activity");
            }
            for activity in activities {
                println!("{}  {}", activity.date, activity.description);
            }
        }
        Some(("template", sub)) => {
            let name = get_str(sub, "name")?;
            let Some(template) = PostTemplate::from_name(name) else {
                bail!("unknown template: {name}");
            };
            print!("{}", template.render(now.date_naive()));
        }
        Some(("preview", sub)) => {
            println!("{}", admin::preview_draft(&draft_from(sub)?)?);
        }
        Some(("export", sub)) => {
            let (filename, content) = match sub.get_one::<String>("file") {
                Some(file) => (file.clone(), admin::export_post(&mut store, &source, file, now)?),
                None => (
                    source::MANIFEST_FILE.to_string(),
                    admin::export_manifest(&mut store, &source, now)?,
                ),
            };
            match sub.get_one::<PathBuf>("out") {
                Some(dir) => {
                    let path = dir.join(filename);
                    std::fs::write(&path, content).with_context(|| format!("while writing {path:?}"))?;
                    println!("Wrote {path:?}");
                }
                None => println!("{content}"),
            }
        }
        Some(("draft", sub)) => {
            let draft = draft_from(sub)?;
            let filename = admin::save_draft(&mut store, &draft, now)?;
            println!("Post \"{}\" has been saved as {filename}.", draft.title);
            if let Some(dir) = sub.get_one::<PathBuf>("out") {
                let (filename, markdown) = admin::export_draft(&draft)?;
                let path = dir.join(filename);
                std::fs::write(&path, markdown).with_context(|| format!("while writing {path:?}"))?;
                admin::add_activity(&mut store, &format!("Downloaded post: {}", draft.title), now)?;
                println!("Wrote {path:?}");
            }
        }
        Some(("drafts", _)) => {
            for filename in admin::drafts(&store).keys() {
                println!("{filename}");
            }
        }
        Some(("posts", sub)) => {
            let posts = source::load_posts(&source)?;
            for post in admin::filter_posts(&posts, sub.get_one::<String>("term").map_or("", String::as_str)) {
                println!("{}  {}  ({})", post.date, post.title, post.file);
            }
        }
        Some(("edit", sub)) => match sub.get_one::<String>("file") {
            Some(file) => {
                let post = source::load_post(&source, file)?;
                let draft = admin::begin_edit(&mut store, &post, now)?;
                println!("{}", draft.to_markdown());
            }
            None => match admin::editing_post(&store) {
                Some(file) => println!("Editing {file}"),
                None => println!("No post is being edited"),
            },
        },
        Some(("delete", sub)) => {
            println!("{}", admin::delete_post(&mut store, get_str(sub, "file")?, now)?);
        }
        Some(("settings", sub)) => {
            let mut settings = Settings::load(&store);
            let mut changed = false;
            for (id, field) in [
                ("primary_color", &mut settings.primary_color),
                ("secondary_color", &mut settings.secondary_color),
                ("banner_image", &mut settings.banner_image),
                ("blog_title", &mut settings.blog_title),
            ] {
                if let Some(value) = sub.get_one::<String>(id) {
                    *field = value.clone();
                    changed = true;
                }
            }
            if changed {
                settings.save(&mut store, now)?;
                println!("Settings saved successfully!");
            }
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        _ => unreachable!("subcommand_required"),
    }

    store.save()
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = cli().get_matches();
    match matches.subcommand() {
        Some(("build", sub)) => run_build(sub),
        Some(("search", sub)) => run_search(sub),
        Some(("posts", sub)) => run_posts(sub),
        Some(("engage", sub)) => run_engage(sub),
        Some(("admin", sub)) => run_admin(sub),
        _ => unreachable!("subcommand_required"),
    }
}
