//! Commands that talk to the device without editing the settings document:
//! `cat`, `lang`, `doctor`, plus the offline `defaults`.

use anyhow::Result;

use dynset::logger::{status_success, status_warning};
use dynset::session::{read_key, write_key};
use dynset::settings::default_document;

use super::common::{Context, Device};

pub fn run_cat(device: &Device, ctx: &Context) -> Result<()> {
    let path = ctx.path.clone();
    let text = device.run("read", ctx.path.display(), move |channel| channel.read(&path))??;
    print!("{text}");
    Ok(())
}

pub fn run_defaults(ctx: &Context) {
    let target = ctx.target();
    println!(
        "{}",
        default_document(&target.root_tag, target.root_version.as_deref())
    );
}

pub fn run_lang(device: &Device, ctx: &Context, value: Option<String>) -> Result<()> {
    let target = ctx.target();
    let path = target.language_path.clone();
    let key = target.language_key.clone();
    let subject = target.language_path.display();

    match value {
        None => {
            let current = device.run("read", subject, move |channel| {
                read_key(channel, &path, &key)
            })??;
            match current {
                Some(value) => println!("{value}"),
                None => status_warning(&format!("{} is not set", target.language_key)),
            }
        }
        Some(value) => {
            let shown = format!("{}={value}", target.language_key);
            let changed = device.run("write", subject, move |channel| {
                write_key(channel, &path, &key, &value)
            })??;
            if changed {
                status_success(&format!("{shown} (verified)"));
            } else {
                status_success(&format!("{shown} already set"));
            }
        }
    }
    Ok(())
}

pub fn run_doctor(device: &Device, ctx: &Context, json: bool) -> Result<()> {
    let path = ctx.path.clone();
    let package = ctx.target().package.clone();
    let diagnosis = device.run("doctor", ctx.path.display(), move |channel| {
        channel.diagnose(&path, package.as_deref())
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&diagnosis)?);
    } else {
        print!("{diagnosis}");
    }
    if diagnosis.warnings.is_empty() {
        status_success("no problems found");
    }
    Ok(())
}
