//! Rollbook CLI Client
//!
//! Command-line interface for interacting with a Rollbook server.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args as ClapArgs, Parser, Subcommand};
use rollbook::network::Client;
use rollbook::protocol::{Command, Response, ResponseBody};
use rollbook::record::{AttachmentSlot, NewStudent, ResultPayload, StudentPatch, StudentRecord};
use rollbook::storage::{AttachmentUploads, MediaKind, Upload};
use rollbook::{Result, RollbookError};

/// Rollbook CLI
#[derive(Parser, Debug)]
#[command(name = "rollbook-cli")]
#[command(about = "CLI for the Rollbook student registry")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7878")]
    server: String,

    /// Shared secret for create, update and delete
    #[arg(long, env = "ROLLBOOK_SECRET_KEY", global = true)]
    secret_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ping the server
    Ping,

    /// List every student
    List,

    /// Register a student
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        course: String,
        #[arg(long)]
        mobile: String,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        dob: String,
        #[arg(long, default_value = "")]
        address: String,

        #[command(flatten)]
        files: FileArgs,
    },

    /// Find a student by name and email
    Find {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },

    /// Show a student's current roll number
    Roll {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },

    /// File an exam result against a roll number
    SetResult {
        /// Roll number the result is filed under
        roll: String,
        /// Student name, must match the record
        #[arg(long)]
        name: String,
        /// Subject score as SUBJECT=VALUE (repeatable)
        #[arg(long = "score", value_parser = parse_score)]
        scores: Vec<(String, u8)>,
    },

    /// Show the student whose result was filed under a roll number
    GetResult {
        roll: String,
    },

    /// Update fields and attachments of a student
    Update {
        id: String,
        /// Full patch as a JSON object
        #[arg(long, conflicts_with_all = ["name", "email", "course", "mobile", "dob", "address"])]
        patch: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        course: Option<String>,
        #[arg(long)]
        mobile: Option<String>,
        #[arg(long)]
        dob: Option<String>,
        #[arg(long)]
        address: Option<String>,

        #[command(flatten)]
        files: FileArgs,
    },

    /// Delete a student by id
    Delete {
        id: String,
    },

    /// Export every student
    Export {
        /// json, csv, xml or text
        #[arg(short, long, default_value = "json")]
        format: String,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// Attachment file paths
#[derive(ClapArgs, Debug, Default)]
struct FileArgs {
    /// Profile photo (jpg or png)
    #[arg(long)]
    photo: Option<PathBuf>,
    /// Signature image (jpg or png)
    #[arg(long)]
    signature: Option<PathBuf>,
    /// Scanned sheet (jpg, png or pdf)
    #[arg(long)]
    sheet: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut client = Client::connect(&args.server)?.with_secret_key(args.secret_key);

    let command = match args.command {
        Commands::Ping => {
            client.ping()?;
            println!("PONG");
            return Ok(());
        }
        Commands::List => Command::List,
        Commands::Create {
            name,
            email,
            course,
            mobile,
            dob,
            address,
            files,
        } => Command::Create {
            student: NewStudent {
                name,
                email,
                course,
                mobile_number: mobile,
                date_of_birth: dob,
                address,
            },
            uploads: read_uploads(&files)?,
        },
        Commands::Find { name, email } => Command::Find { name, email },
        Commands::Roll { name, email } => Command::RollNumber { name, email },
        Commands::SetResult { roll, name, scores } => Command::SetResult {
            roll_number: roll,
            payload: ResultPayload::from_scores(name, scores.into_iter().collect::<BTreeMap<_, _>>()),
        },
        Commands::GetResult { roll } => Command::GetResult { roll_number: roll },
        Commands::Update {
            id,
            patch,
            name,
            email,
            course,
            mobile,
            dob,
            address,
            files,
        } => {
            let patch = match patch {
                Some(json) => StudentPatch::from_json(&json)?,
                None => StudentPatch {
                    name,
                    email,
                    course,
                    mobile_number: mobile,
                    date_of_birth: dob,
                    address,
                    result: None,
                },
            };
            Command::Update {
                id,
                patch,
                uploads: read_uploads(&files)?,
            }
        }
        Commands::Delete { id } => Command::Delete { id },
        Commands::Export { format, out } => {
            let response = client.send(Command::Export {
                format: format.parse()?,
            })?;
            return write_export(response, out.as_deref());
        }
    };

    let response = client.send(command)?;
    print_response(response)
}

// =============================================================================
// Output
// =============================================================================

fn print_response(response: Response) -> Result<()> {
    if !response.is_ok() {
        return Err(failure(&response));
    }

    match response.body {
        ResponseBody::Pong => println!("PONG"),
        ResponseBody::Record(record) => print_record(&record),
        ResponseBody::Records(records) => {
            if records.is_empty() {
                println!("(no students)");
            }
            for record in &records {
                print_record(record);
                println!();
            }
        }
        ResponseBody::RollNumber(roll) => println!("{}", roll),
        ResponseBody::Export(export) => {
            println!("{}", String::from_utf8_lossy(&export.body));
        }
        ResponseBody::Error { message } => println!("{}", message),
    }
    Ok(())
}

fn print_record(record: &StudentRecord) {
    println!("id:       {}", record.id);
    println!("name:     {}", record.name);
    println!("email:    {}", record.email);
    println!("course:   {}", record.course);
    println!("mobile:   {}", record.mobile_number);
    println!("dob:      {}", record.date_of_birth);
    if !record.address.is_empty() {
        println!("address:  {}", record.address);
    }
    match record.roll_number() {
        Ok(roll) => println!("roll:     {}", roll),
        Err(_) => println!("roll:     -"),
    }
    for slot in AttachmentSlot::ALL {
        if let Some(reference) = record.attachment_ref(slot) {
            println!("{:<9} {}", format!("{}:", slot), reference);
        }
    }
    if let Some(result) = &record.result {
        println!("result:   filed under {}", result.roll_number);
        for (subject, score) in &result.scores {
            println!("  {:<16} {:>3}", subject, score);
        }
        println!("  total {} / {:.2}%", result.total, result.percentage);
    }
}

fn write_export(response: Response, out: Option<&Path>) -> Result<()> {
    if !response.is_ok() {
        return Err(failure(&response));
    }

    match response.body {
        ResponseBody::Export(export) => match out {
            Some(path) => {
                fs::write(path, &export.body)?;
                println!(
                    "Wrote {} bytes ({}) to {}",
                    export.body.len(),
                    export.content_type,
                    path.display()
                );
                Ok(())
            }
            None => {
                println!("{}", String::from_utf8_lossy(&export.body));
                Ok(())
            }
        },
        other => Err(RollbookError::Protocol(format!(
            "unexpected reply to export: {:?}",
            other
        ))),
    }
}

fn failure(response: &Response) -> RollbookError {
    RollbookError::Network(format!(
        "{:?}: {}",
        response.status,
        response.message().unwrap_or("no message")
    ))
}

// =============================================================================
// Input
// =============================================================================

fn read_uploads(files: &FileArgs) -> Result<AttachmentUploads> {
    let mut uploads = AttachmentUploads::default();
    let paths = [
        (AttachmentSlot::Profile, &files.photo),
        (AttachmentSlot::Signature, &files.signature),
        (AttachmentSlot::Sheet, &files.sheet),
    ];
    for (slot, path) in paths {
        if let Some(path) = path {
            uploads.set(slot, read_upload(path)?);
        }
    }
    Ok(uploads)
}

/// Load a file, declaring the content type its extension implies
fn read_upload(path: &Path) -> Result<Upload> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| RollbookError::validation("file", format!("{} has no file name", path.display())))?;

    let content_type = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(MediaKind::from_extension)
        .map(|kind| kind.mime())
        .ok_or_else(|| RollbookError::UnsupportedMediaType(file_name.clone()))?;

    let data = fs::read(path)?;
    Ok(Upload::new(file_name, content_type, data))
}

fn parse_score(raw: &str) -> std::result::Result<(String, u8), String> {
    let (subject, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected SUBJECT=VALUE, got {}", raw))?;
    let value = value
        .trim()
        .parse::<u8>()
        .map_err(|e| format!("bad score for {}: {}", subject, e))?;
    Ok((subject.trim().to_string(), value))
}
