//! Administrator commands for categories and locations.
//!
//! Categories and locations are never deleted here, they are hidden
//! by unpublishing them.
use crate::dbopt::DbOpt;
use crate::models::Slug;
use crate::schema::categories::dsl as c;
use crate::schema::locations::dsl as l;
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use diesel::prelude::*;
use tracing::info;

#[derive(Subcommand)]
pub enum CategoryCmd {
    /// List all categories
    List(DbOnly),
    /// Add a new category
    Add(AddCategory),
    /// Make a category and its posts public
    Publish(CategoryRef),
    /// Hide a category and all posts in it
    Hide(CategoryRef),
}

#[derive(Subcommand)]
pub enum LocationCmd {
    /// List all locations
    List(DbOnly),
    /// Add a new location
    Add(AddLocation),
    /// Show a location on posts
    Publish(LocationRef),
    /// Stop showing a location on posts
    Hide(LocationRef),
}

#[derive(Parser)]
pub struct DbOnly {
    #[clap(flatten)]
    db: DbOpt,
}

#[derive(Parser)]
pub struct AddCategory {
    #[clap(flatten)]
    db: DbOpt,

    /// The category title.
    #[clap(long)]
    title: String,

    /// A description of what the category is about.
    #[clap(long, default_value = "")]
    description: String,

    /// Url identifier, made from the title if not given.
    #[clap(long)]
    slug: Option<Slug>,

    /// Create the category hidden.
    #[clap(long)]
    hidden: bool,
}

#[derive(Parser)]
pub struct CategoryRef {
    #[clap(flatten)]
    db: DbOpt,

    /// Url identifier of the category.
    slug: Slug,
}

#[derive(Parser)]
pub struct AddLocation {
    #[clap(flatten)]
    db: DbOpt,

    /// The name of the place.
    name: String,

    /// Create the location hidden.
    #[clap(long)]
    hidden: bool,
}

#[derive(Parser)]
pub struct LocationRef {
    #[clap(flatten)]
    db: DbOpt,

    /// Id of the location.
    id: i32,
}

impl CategoryCmd {
    pub fn run(self) -> Result<()> {
        match self {
            CategoryCmd::List(args) => {
                let mut db = args.db.get_db()?;
                let cats = c::categories
                    .select((c::slug, c::title, c::is_published))
                    .order(c::title)
                    .load::<(String, String, bool)>(&mut db)?;
                for (slug, title, is_published) in cats {
                    println!("{slug:20} {} {title}", shown(is_published));
                }
            }
            CategoryCmd::Add(args) => {
                let slug = match args.slug {
                    Some(slug) => slug,
                    None => slug_for(&args.title).parse()?,
                };
                let mut db = args.db.get_db()?;
                let id = diesel::insert_into(c::categories)
                    .values((
                        c::title.eq(&args.title),
                        c::description.eq(&args.description),
                        c::slug.eq(slug.as_ref()),
                        c::is_published.eq(!args.hidden),
                    ))
                    .returning(c::id)
                    .get_result::<i32>(&mut db)?;
                info!("Created category #{id} {:?} as {slug}", args.title);
            }
            CategoryCmd::Publish(args) => args.set_published(true)?,
            CategoryCmd::Hide(args) => args.set_published(false)?,
        }
        Ok(())
    }
}

impl CategoryRef {
    fn set_published(self, is_published: bool) -> Result<()> {
        let mut db = self.db.get_db()?;
        let n = diesel::update(c::categories.filter(c::slug.eq(self.slug.as_ref())))
            .set(c::is_published.eq(is_published))
            .execute(&mut db)?;
        if n == 0 {
            bail!("No category {:?}", self.slug.as_ref());
        }
        info!("Category {} is now {}", self.slug, shown(is_published));
        Ok(())
    }
}

impl LocationCmd {
    pub fn run(self) -> Result<()> {
        match self {
            LocationCmd::List(args) => {
                let mut db = args.db.get_db()?;
                let locs = l::locations
                    .select((l::id, l::name, l::is_published))
                    .order(l::name)
                    .load::<(i32, String, bool)>(&mut db)?;
                for (id, name, is_published) in locs {
                    println!("{id:5}. {} {name}", shown(is_published));
                }
            }
            LocationCmd::Add(args) => {
                let mut db = args.db.get_db()?;
                let id = diesel::insert_into(l::locations)
                    .values((
                        l::name.eq(&args.name),
                        l::is_published.eq(!args.hidden),
                    ))
                    .returning(l::id)
                    .get_result::<i32>(&mut db)?;
                info!("Created location #{id} {:?}", args.name);
            }
            LocationCmd::Publish(args) => args.set_published(true)?,
            LocationCmd::Hide(args) => args.set_published(false)?,
        }
        Ok(())
    }
}

impl LocationRef {
    fn set_published(self, is_published: bool) -> Result<()> {
        let mut db = self.db.get_db()?;
        let n = diesel::update(l::locations.filter(l::id.eq(self.id)))
            .set(l::is_published.eq(is_published))
            .execute(&mut db)?;
        if n == 0 {
            bail!("No location #{}", self.id);
        }
        info!("Location #{} is now {}", self.id, shown(is_published));
        Ok(())
    }
}

/// A slug made from a title, cut to fit the slug column.
fn slug_for(title: &str) -> String {
    let mut slug = slug::slugify(title);
    slug.truncate(Slug::MAX_LEN);
    slug.trim_end_matches('-').to_string()
}

fn shown(is_published: bool) -> &'static str {
    if is_published {
        "published"
    } else {
        "hidden"
    }
}

#[test]
fn slugify_titles() {
    let slug: Slug = slug_for("Travel & Food").parse().unwrap();
    assert_eq!(slug.as_ref(), "travel-food");
}

#[test]
fn slugify_long_titles() {
    let title = "Notes from a very long journey ".repeat(8);
    let slug = slug_for(&title);
    assert!(slug.len() <= Slug::MAX_LEN);
    assert!(!slug.ends_with('-'));
    assert!(slug.parse::<Slug>().is_ok());
}
