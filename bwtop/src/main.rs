//! Entry point for the bwtop TUI. Parses args, resolves the endpoint and runs the App.

mod app;

use app::App;
use bwtop::fetch::DEFAULT_URL;
use bwtop::profiles::{load_profiles, save_profiles, ProfileEntry, ProfileRequest, ResolveProfile};
use bwtop::scheduler::DEFAULT_INTERVAL;
use std::env;
use std::io::{self, Write};
use std::time::Duration;

const USAGE_FLAGS: &str =
    "[--profile NAME|-P NAME] [--save] [--interval-ms MS|-i MS] [--demo] [--dry-run] [http://HOST:PORT/manager/]";

struct ParsedArgs {
    url: Option<String>,
    profile: Option<String>,
    interval_ms: Option<u64>,
    save: bool,
    demo: bool,
    dry_run: bool,
}

fn parse_interval(v: &str) -> Result<u64, String> {
    match v.parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(ms),
        _ => Err(format!("Invalid interval '{v}': expected a positive number of milliseconds")),
    }
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, String> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "bwtop".into());
    let mut url: Option<String> = None;
    let mut profile: Option<String> = None;
    let mut interval_ms: Option<u64> = None;
    let mut save = false; // --save
    let mut demo = false; // --demo
    let mut dry_run = false; // --dry-run

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                return Err(format!("Usage: {prog} {USAGE_FLAGS}"));
            }
            "--profile" | "-P" => {
                profile = it.next();
            }
            "--interval-ms" | "-i" => {
                let v = it.next().unwrap_or_default();
                interval_ms = Some(parse_interval(&v)?);
            }
            "--save" => {
                save = true;
            }
            "--demo" => {
                demo = true;
            }
            "--dry-run" => {
                dry_run = true;
            }
            _ if arg.starts_with("--profile=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    if !v.is_empty() {
                        profile = Some(v.to_string());
                    }
                }
            }
            _ if arg.starts_with("--interval-ms=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    interval_ms = Some(parse_interval(v)?);
                }
            }
            _ => {
                if url.is_none() {
                    url = Some(arg);
                } else {
                    return Err(format!("Unexpected argument. Usage: {prog} {USAGE_FLAGS}"));
                }
            }
        }
    }
    Ok(ParsedArgs {
        url,
        profile,
        interval_ms,
        save,
        demo,
        dry_run,
    })
}

/// Log to a file only; stdout belongs to the TUI.
fn init_logging() {
    let Some(path) = env::var_os("BWTOP_LOG_FILE") else {
        return;
    };
    let file = match std::fs::OpenOptions::new().create(true).append(true).open(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("bwtop: cannot open log file {}: {e}", path.to_string_lossy());
            return;
        }
    };
    let filter = tracing_subscriber::EnvFilter::try_from_env("BWTOP_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Reuse the same parsing logic for testability
    let parsed = match parse_args(env::args()) {
        Ok(v) => v,
        Err(msg) => {
            eprintln!("{msg}");
            return Ok(());
        }
    };
    init_logging();

    // Demo mode short-circuit (ignore other args except conflicting ones)
    if parsed.demo || matches!(parsed.profile.as_deref(), Some("demo")) {
        return run_demo_mode(parsed.interval_ms).await;
    }

    let profiles_file = load_profiles();
    let req = ProfileRequest {
        profile_name: parsed.profile.clone(),
        url: parsed.url.clone(),
        interval_ms: parsed.interval_ms,
    };
    let resolved = req.resolve(&profiles_file);

    // Determine final connection parameters (and maybe mutated profiles to persist)
    let mut profiles_mut = profiles_file.clone();
    let entry: ProfileEntry = match resolved {
        ResolveProfile::Direct(entry) => {
            // Possibly save if profile specified and --save or new entry
            if let Some(name) = parsed.profile.as_ref() {
                match profiles_mut.profiles.get(name) {
                    None => {
                        // New profile: auto-save immediately
                        profiles_mut.profiles.insert(name.clone(), entry.clone());
                        save_or_warn(&profiles_mut);
                    }
                    Some(existing) if *existing != entry => {
                        let overwrite = parsed.save
                            || prompt_yes_no(&format!(
                                "Overwrite existing profile '{name}'? [y/N]: "
                            ));
                        if overwrite {
                            profiles_mut.profiles.insert(name.clone(), entry.clone());
                            save_or_warn(&profiles_mut);
                        }
                    }
                    Some(_) => {}
                }
            }
            entry
        }
        ResolveProfile::Loaded(entry) => entry,
        ResolveProfile::PromptSelect(mut names) => {
            // Always add demo option to list
            if !names.iter().any(|n| n == "demo") {
                names.push("demo".into());
            }
            eprintln!("Select profile:");
            for (i, n) in names.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, n);
            }
            let line = prompt_string("Enter number (or blank to abort): ")?;
            let Some(name) = line
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|idx| (1..=names.len()).contains(idx))
                .map(|idx| names[idx - 1].clone())
            else {
                return Ok(());
            };
            if name == "demo" {
                return run_demo_mode(parsed.interval_ms).await;
            }
            match profiles_mut.profiles.get(&name) {
                Some(entry) => ProfileEntry {
                    url: entry.url.clone(),
                    interval_ms: parsed.interval_ms.or(entry.interval_ms),
                },
                None => return Ok(()),
            }
        }
        ResolveProfile::PromptCreate(name) => {
            eprintln!("Profile '{name}' does not exist yet.");
            let url = prompt_string(&format!("Enter URL (blank for {DEFAULT_URL}): "))?;
            let url = match url.trim() {
                "" => DEFAULT_URL.to_string(),
                u => u.to_string(),
            };
            let ms = prompt_string("Enter poll interval in ms (or leave blank for 5000): ")?;
            let interval_ms = match ms.trim() {
                "" => parsed.interval_ms,
                v => Some(parse_interval(v)?),
            };
            let entry = ProfileEntry { url, interval_ms };
            profiles_mut.profiles.insert(name.clone(), entry.clone());
            save_or_warn(&profiles_mut);
            entry
        }
        ResolveProfile::None => {
            eprintln!("No URL provided and no profiles to select.");
            eprintln!("Try: bwtop {DEFAULT_URL}  (or --demo)");
            return Ok(());
        }
    };

    let interval = entry
        .interval_ms
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_INTERVAL);

    if parsed.dry_run {
        println!("endpoint: {} interval: {}ms", entry.url, interval.as_millis());
        return Ok(());
    }

    let mut app = App::new(entry.url, interval);
    app.run().await
}

fn save_or_warn(p: &bwtop::profiles::ProfilesFile) {
    if let Err(e) = save_profiles(p) {
        eprintln!("bwtop: could not save profiles: {e}");
    }
}

fn prompt_yes_no(prompt: &str) -> bool {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_ok() {
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    } else {
        false
    }
}

fn prompt_string(prompt: &str) -> io::Result<String> {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}

// --- Demo Mode ---

async fn run_demo_mode(interval_ms: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    let port = 3231;
    let url = format!("http://127.0.0.1:{port}/manager/");
    let interval = interval_ms
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_INTERVAL);
    let child = spawn_demo_agent(port, interval)?;
    // Use select to handle Ctrl-C and normal quit
    let mut app = App::new(url, interval);
    tokio::select! {
        res = app.run() => { drop(child); res }
        _ = tokio::signal::ctrl_c() => {
            // Drop child (kills agent) then return
            drop(child);
            Ok(())
        }
    }
}

struct DemoGuard(std::process::Child);
impl Drop for DemoGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

fn spawn_demo_agent(port: u16, interval: Duration) -> Result<DemoGuard, Box<dyn std::error::Error>> {
    let candidate = find_agent_executable();
    let mut cmd = std::process::Command::new(candidate);
    cmd.arg("--port").arg(port.to_string());
    cmd.env("BWTOP_AGENT_SAMPLE_MS", interval.as_millis().to_string());
    cmd.stdout(std::process::Stdio::null());
    cmd.stderr(std::process::Stdio::null());
    let child = cmd.spawn()?;
    // Give the agent a brief moment to start
    std::thread::sleep(Duration::from_millis(300));
    Ok(DemoGuard(child))
}

fn find_agent_executable() -> std::path::PathBuf {
    let self_exe = std::env::current_exe().ok();
    if let Some(exe) = self_exe {
        if let Some(parent) = exe.parent() {
            #[cfg(windows)]
            let name = "bwtop_agent.exe";
            #[cfg(not(windows))]
            let name = "bwtop_agent";
            let candidate = parent.join(name);
            if candidate.exists() {
                return candidate;
            }
        }
    }
    // Fallback to relying on PATH
    std::path::PathBuf::from("bwtop_agent")
}
