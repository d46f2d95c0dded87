use besiege_mod_tool::{ManifestTemplate, Mod, Resource};
use color_eyre::eyre::{self, eyre, WrapErr};
use serde::Serialize;
use std::path::PathBuf;
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, StructOpt)]
#[structopt(name = "besiege-mod-tool", about = "Inspect, create and clone Besiege mods")]
struct Opt {
    /// Log what gets read and written
    #[structopt(short, long)]
    verbose: bool,
    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Print the manifest of a mod directory
    Info {
        #[structopt(parse(from_os_str))]
        path: PathBuf,
        /// Print as JSON
        #[structopt(long)]
        json: bool,
    },
    /// Create a new mod directory from the manifest template
    New {
        #[structopt(parse(from_os_str))]
        path: PathBuf,
        #[structopt(long)]
        name: String,
        #[structopt(long)]
        author: String,
        /// JSON file overriding the template defaults
        #[structopt(long, parse(from_os_str))]
        template: Option<PathBuf>,
    },
    /// Write an edited copy of a mod's manifests to another directory
    Clone {
        #[structopt(parse(from_os_str))]
        source: PathBuf,
        #[structopt(parse(from_os_str))]
        destination: PathBuf,
        #[structopt(flatten)]
        edits: Edits,
    },
}

#[derive(Debug, StructOpt)]
struct Edits {
    #[structopt(long)]
    name: Option<String>,
    #[structopt(long)]
    author: Option<String>,
    #[structopt(long)]
    version: Option<String>,
    #[structopt(long)]
    description: Option<String>,
    #[structopt(long)]
    debug: Option<bool>,
    #[structopt(long)]
    multiplayer_compatible: Option<bool>,
    /// New mod ID. Content made for the old ID will no longer find the mod.
    #[structopt(long)]
    id: Option<String>,
    #[structopt(long = "add-assembly")]
    assemblies: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Summary<'a> {
    name: &'a str,
    author: &'a str,
    version: &'a str,
    description: &'a str,
    id: &'a str,
    debug: bool,
    multiplayer_compatible: bool,
    assemblies: &'a [String],
    blocks: Vec<&'a str>,
    entities: Vec<&'a str>,
    resources: Vec<&'a Resource>,
}

impl<'a> Summary<'a> {
    fn of(m: &'a Mod) -> eyre::Result<Self> {
        let object_paths = |objects: &'a [besiege_mod_tool::ObjectManifest]| {
            objects
                .iter()
                .filter_map(|object| object.path.as_deref())
                .collect::<Vec<_>>()
        };
        Ok(Self {
            name: m.name()?,
            author: m.author()?,
            version: m.version()?,
            description: m.description()?,
            id: m.id()?,
            debug: m.is_debug()?,
            multiplayer_compatible: m.is_multiplayer_compatible()?,
            assemblies: m.assemblies()?,
            blocks: object_paths(m.blocks()?),
            entities: object_paths(m.entities()?),
            resources: m.resources()?.values().collect(),
        })
    }
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let opt = Opt::from_args();

    let default_level = if opt.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match opt.command {
        Command::Info { path, json } => info(path, json),
        Command::New {
            path,
            name,
            author,
            template,
        } => create(path, &name, &author, template),
        Command::Clone {
            source,
            destination,
            edits,
        } => clone_mod(source, destination, edits),
    }
}

fn info(path: PathBuf, json: bool) -> eyre::Result<()> {
    let mut m = Mod::new();
    m.load_from_disk(&path, false)
        .wrap_err_with(|| format!("couldn't load mod from {}", path.display()))?;
    let summary = Summary::of(&m)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{} {} by {}", summary.name, summary.version, summary.author);
    println!("{}", summary.description);
    println!("id: {}", summary.id);
    println!(
        "debug: {}, multiplayer: {}",
        summary.debug, summary.multiplayer_compatible
    );
    for assembly in summary.assemblies {
        println!("assembly {}", assembly);
    }
    for block in &summary.blocks {
        println!("block {}", block);
    }
    for entity in &summary.entities {
        println!("entity {}", entity);
    }
    for resource in &summary.resources {
        println!(
            "resource {} ({}) {}",
            resource.name, resource.resource_type, resource.path
        );
    }
    Ok(())
}

fn create(path: PathBuf, name: &str, author: &str, template: Option<PathBuf>) -> eyre::Result<()> {
    if path.join("Mod.xml").exists() {
        return Err(eyre!("{} already contains a Mod.xml", path.display()));
    }

    let template = match template {
        Some(template_path) => {
            let text = std::fs::read_to_string(&template_path).wrap_err_with(|| {
                format!("couldn't read template {}", template_path.display())
            })?;
            serde_json::from_str(&text)?
        }
        None => ManifestTemplate::default(),
    };

    let mut m = Mod::new();
    m.create_from_template(&template, name, author)?;
    m.save_to_disk(&path)?;
    println!("created {} in {}", name, path.display());
    Ok(())
}

fn clone_mod(source: PathBuf, destination: PathBuf, edits: Edits) -> eyre::Result<()> {
    let mut m = Mod::new();
    m.load_from_disk(&source, true)
        .wrap_err_with(|| format!("couldn't load mod from {}", source.display()))?;

    if let Some(name) = edits.name {
        m.set_name(name)?;
    }
    if let Some(author) = edits.author {
        m.set_author(author)?;
    }
    if let Some(version) = edits.version {
        m.set_version(version)?;
    }
    if let Some(description) = edits.description {
        m.set_description(description)?;
    }
    if let Some(debug) = edits.debug {
        m.set_debug(debug)?;
    }
    if let Some(multiplayer_compatible) = edits.multiplayer_compatible {
        m.set_multiplayer_compatible(multiplayer_compatible)?;
    }
    if let Some(id) = edits.id {
        m.set_id(id)?;
    }
    for assembly in edits.assemblies {
        m.add_assembly(assembly)?;
    }

    m.save_to_disk(&destination)?;
    println!(
        "cloned {} to {}",
        source.display(),
        destination.display()
    );
    Ok(())
}
