#![cfg(not(tarpaulin_include))]

use skill_matrix::{
    AppConfig, Criticality, Directory, FileStore, MatrixSession, MemoryDirectory, Notice,
    SessionState,
};
use std::fs;
use std::io::{self, Write};
use std::time::Instant;

const HELP: &str = "Commands:
  departments                 List departments
  lines                       List lines of the selected department
  roster                      List the roster of the selected department
  dept <id>                   Select a department
  line <id>                   Select a line and load its matrix
  show                        Display the matrix
  add                         Add a blank operator row
  level <row> <col> <level>   Set a skill level
  min <row> <col> <level>     Set a minimum required level
  crit <row> <col> <c|nc>     Set critical / non-critical
  code <row> <text>           Set the classification code
  station <row> <station-id>  Set the assigned station
  assign <row> <person-id>    Assign a roster person to a manual row
  save                        Save the matrix
  export [path]               Export the workbook (.xlsx)
  csv [path]                  Export the table as CSV
  print [path]                Print the form as text
  levels                      List the skill levels
  state                       Show the session state
  q                           Quit";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = AppConfig::from_env()?;
    let mut directory = MemoryDirectory::from_json_file(&config.directory_file).unwrap_or_else(|e| {
        eprintln!(
            "Warning: could not read {}: {}",
            config.directory_file.display(),
            e
        );
        MemoryDirectory::default()
    });
    if !config.level_labels.is_empty() {
        directory.level_labels = config.level_labels.clone();
    }
    let mut store = FileStore::open(&config.data_dir)?;

    let mut session = MatrixSession::new(config.header.clone(), config.footer.clone());
    session.load_directory(&directory);

    let mut start_time = Instant::now();
    let mut status = String::from("ok");
    loop {
        let elapsed_time = start_time.elapsed().as_secs_f64();
        print!("[{:.1}] ({}) > ", elapsed_time, status);
        io::stdout().flush()?;

        let mut command = String::new();
        if io::stdin().read_line(&mut command)? == 0 {
            break;
        }
        let command = command.trim();
        start_time = Instant::now();

        if command.is_empty() {
            status = String::from("invalid command");
            continue;
        }
        if command == "q" {
            break;
        }

        let mut parts = command.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default();
        let rest = parts.next().unwrap_or_default().trim();

        status = match run_command(name, rest, &mut session, &directory, &mut store) {
            Ok(msg) => msg,
            Err(msg) => msg,
        };
    }

    Ok(())
}

fn run_command(
    name: &str,
    rest: &str,
    session: &mut MatrixSession,
    directory: &MemoryDirectory,
    store: &mut FileStore,
) -> Result<String, String> {
    let args: Vec<&str> = rest.split_whitespace().collect();

    match name {
        "help" => {
            println!("{}", HELP);
            Ok("ok".into())
        }
        "departments" => {
            for d in session.departments() {
                println!("  {:<12}{}", d.id, d.name);
            }
            Ok("ok".into())
        }
        "lines" => {
            for l in session.lines() {
                println!("  {:<12}{}", l.id, l.name);
            }
            Ok("ok".into())
        }
        "roster" => {
            for p in session.roster() {
                println!("  {:<12}{:<24}{}", p.person_id, p.name, p.role);
            }
            Ok("ok".into())
        }
        "dept" => {
            let id = args.first().ok_or("usage: dept <id>")?;
            session
                .select_department(directory, id)
                .map_err(|e| e.to_string())?;
            Ok(format!("{} lines", session.lines().len()))
        }
        "line" => {
            let id = args.first().ok_or("usage: line <id>")?;
            session
                .select_line(directory, &*store, id)
                .map_err(|e| e.to_string())?;
            Ok(format!("{} rows", session.grid().len()))
        }
        "show" => {
            let text = session.print().map_err(|n| n.to_string())?;
            println!("{}", text);
            Ok("ok".into())
        }
        "add" => {
            let idx = session.add_operator().map_err(|e| e.to_string())?;
            Ok(format!("added row {}", idx + 1))
        }
        "level" | "min" | "crit" => {
            let [row, col, value] = args.as_slice() else {
                return Err(format!("usage: {} <row> <col> <value>", name));
            };
            let (row, col) = (index(row)?, index(col)?);
            let grid = session.grid_mut().map_err(|e| e.to_string())?;
            let result = match name {
                "level" => grid.set_level(row, col, value),
                "min" => grid.set_min_level(row, col, value),
                _ => {
                    let criticality: Criticality = value.parse()?;
                    grid.set_criticality(row, col, criticality)
                }
            };
            result.map(|_| "ok".into()).map_err(|e| e.to_string())
        }
        "code" => {
            let (row, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let row = index(row)?;
            session
                .grid_mut()
                .and_then(|g| g.set_classification(row, text))
                .map(|_| "ok".into())
                .map_err(|e| e.to_string())
        }
        "station" => {
            let [row, station] = args.as_slice() else {
                return Err("usage: station <row> <station-id>".into());
            };
            let row = index(row)?;
            session
                .grid_mut()
                .and_then(|g| g.set_assigned_station(row, station))
                .map(|_| "ok".into())
                .map_err(|e| e.to_string())
        }
        "assign" => {
            let [row, person] = args.as_slice() else {
                return Err("usage: assign <row> <person-id>".into());
            };
            session
                .assign_person(index(row)?, person)
                .map(|_| "ok".into())
                .map_err(|e| e.to_string())
        }
        "save" => match session.save(store) {
            Notice::Error(msg) => Err(msg),
            notice => Ok(notice.to_string()),
        },
        "export" => {
            let file = session.export().map_err(|n| n.to_string())?;
            let path = args.first().map(|p| p.to_string()).unwrap_or(file.filename);
            fs::write(&path, &file.bytes).map_err(|e| e.to_string())?;
            Ok(format!("wrote {}", path))
        }
        "csv" => {
            let file = session.export_csv().map_err(|n| n.to_string())?;
            let path = args.first().map(|p| p.to_string()).unwrap_or(file.filename);
            fs::write(&path, &file.bytes).map_err(|e| e.to_string())?;
            Ok(format!("wrote {}", path))
        }
        "print" => {
            let text = session.print().map_err(|n| n.to_string())?;
            match args.first() {
                Some(path) => {
                    fs::write(path, text).map_err(|e| e.to_string())?;
                    Ok(format!("wrote {}", path))
                }
                None => {
                    println!("{}", text);
                    Ok("ok".into())
                }
            }
        }
        "state" => Ok(match session.state() {
            SessionState::NoLineSelected => "no line selected".into(),
            SessionState::Loaded => "loaded".into(),
            SessionState::Saving => "saving".into(),
        }),
        "levels" => {
            let labels = directory.level_labels().map_err(|e| e.to_string())?;
            println!("  {}", session.scale().labels().join(" "));
            Ok(if labels.is_empty() {
                "default scale".into()
            } else {
                "configured scale".into()
            })
        }
        _ => Err(String::from("invalid command")),
    }
}

// Rows and columns are shown 1-based.
fn index(arg: &str) -> Result<usize, String> {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("invalid index: {}", arg)),
    }
}
