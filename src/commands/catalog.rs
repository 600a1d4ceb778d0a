use anyhow::{Context, Result};
use std::io::Write;

use crate::tracker::Tracker;

pub fn activities<W: Write>(tracker: &dyn Tracker, out: &mut W) -> Result<()> {
    let activities = tracker
        .list_activities()
        .context("Error fetching activities")?;

    if activities.is_empty() {
        writeln!(out, "No activities found.")?;
        return Ok(());
    }

    writeln!(out, "Available activities:")?;
    for activity in activities {
        if activity.is_default {
            writeln!(out, "- {} (default)", activity.name)?;
        } else {
            writeln!(out, "- {}", activity.name)?;
        }
    }
    Ok(())
}

pub fn projects<W: Write>(tracker: &dyn Tracker, out: &mut W) -> Result<()> {
    let projects = tracker.projects().context("Error fetching projects")?;

    if projects.is_empty() {
        writeln!(out, "No projects found.")?;
        return Ok(());
    }

    writeln!(out, "Available projects:")?;
    for project in projects {
        writeln!(out, "{}: {}", project.id, project.name)?;
    }
    Ok(())
}
