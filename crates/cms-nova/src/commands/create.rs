//! Default command: create a new project from the template

use anyhow::{bail, Context, Result};
use cms_nova_core::DEFAULT_TEMPLATE_REPO;
use cms_nova_projects::scaffold::{
    clone_template, install_dependencies, prepare_destination, CreateOptions,
};

use super::current_dir;
use crate::cli::CreateArgs;
use crate::output;

pub async fn run(args: CreateArgs) -> Result<()> {
    let Some(name) = args.name else {
        bail!("Please specify the project directory:\n    create-cms-nova <project-name>");
    };

    let template_repo = args
        .template_repo
        .unwrap_or_else(|| DEFAULT_TEMPLATE_REPO.to_string());
    let options = CreateOptions {
        name,
        parent_dir: current_dir()?,
        template_repo,
        branch: args.branch,
    };

    // Fail on bad names and existing directories before any network access
    let destination = prepare_destination(&options)?;

    output::header("Create CMS Nova Project");
    output::kv("Project name", &options.name);
    output::kv("Template", &options.template_repo);
    output::kv("Location", destination.as_str());
    println!();

    let spinner = output::spinner("Downloading template...");
    let cloned = clone_template(&options).await;
    spinner.finish_and_clear();

    if let Err(e) = cloned {
        show_manual_fallback(&options, false);
        return Err(e).context("Failed to download the template");
    }
    output::success("Template downloaded");

    if args.skip_install {
        output::info("Skipping dependency installation");
    } else {
        output::info("Installing dependencies (npm install --legacy-peer-deps)...");
        if let Err(e) = install_dependencies(&destination).await {
            show_manual_fallback(&options, true);
            return Err(e).context(format!("Dependency installation failed in {}", destination));
        }
        output::success("Dependencies installed");
    }

    println!();
    output::success(&format!("Project '{}' created", options.name));
    println!();
    output::info("Next steps:");
    output::command(&format!("cd {}", options.name));
    if args.skip_install {
        output::command("npm install --legacy-peer-deps");
    }
    output::command("cp .env.example .env");
    output::command("npx prisma db push && npx prisma generate");
    output::command("npm run dev");
    println!();
    output::info("Then open http://localhost:3000");
    output::info("Keep the project current later with: create-cms-nova upgrade");

    Ok(())
}

/// Template location and the commands that finish a failed creation by hand
fn manual_fallback(options: &CreateOptions, cloned: bool) -> (String, Vec<String>) {
    let mut steps = Vec::new();
    if !cloned {
        steps.push(format!("git clone {} {}", options.template_repo, options.name));
    }
    steps.push(format!("cd {}", options.name));
    steps.push("npm install --legacy-peer-deps".to_string());

    let info = format!(
        "Template: {}. You can finish the setup manually:",
        options.template_repo
    );
    (info, steps)
}

fn show_manual_fallback(options: &CreateOptions, cloned: bool) {
    let (info, steps) = manual_fallback(options, cloned);
    output::info(&info);
    for step in &steps {
        output::command(step);
    }
}
