use std::env;

use gemmbench::device::{ComputeDevice, SimDevice};
use gemmbench::harness::{run_accelerated, run_reference, run_vector_add, RunConfig};
use gemmbench::report::RunReport;
use gemmbench::{BenchError, Result};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() == 1 {
        print_usage();
        return Ok(());
    }

    match args[1].as_str() {
        "matmul" => run_matmul(&args[2..]),
        "vector-add" => run_vector_add_cmd(&args[2..]),
        "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        command => Err(BenchError::InvalidArgument {
            op: "cli",
            msg: format!("unknown command {command}"),
        }),
    }
}

fn run_matmul(args: &[String]) -> Result<()> {
    let parser = ArgParser::new(args);
    let backend = parser.get("backend")?.unwrap_or_else(|| "cpu".to_string());
    let format = parser.get("format")?.unwrap_or_else(|| "table".to_string());
    let config = RunConfig::default();

    let report = match backend.as_str() {
        "cpu" => run_reference(&config)?,
        "sim" => {
            let mut device = SimDevice::new();
            run_accelerated(&mut device, &config)?
        }
        "opencl" => {
            let mut device = opencl_device("cli.matmul")?;
            run_accelerated(device.as_mut(), &config)?
        }
        other => {
            return Err(BenchError::InvalidArgument {
                op: "cli.matmul",
                msg: format!("unknown backend {other}"),
            })
        }
    };
    emit_report(&report, &format, "cli.matmul")
}

fn run_vector_add_cmd(args: &[String]) -> Result<()> {
    let parser = ArgParser::new(args);
    let backend = parser.get("backend")?.unwrap_or_else(|| "sim".to_string());
    let format = parser.get("format")?.unwrap_or_else(|| "table".to_string());
    let config = RunConfig::vector_add();

    let report = match backend.as_str() {
        "sim" => {
            let mut device = SimDevice::new();
            run_vector_add(&mut device, &config)?
        }
        "opencl" => {
            let mut device = opencl_device("cli.vector_add")?;
            run_vector_add(device.as_mut(), &config)?
        }
        other => {
            return Err(BenchError::InvalidArgument {
                op: "cli.vector_add",
                msg: format!("unknown backend {other}"),
            })
        }
    };
    emit_report(&report, &format, "cli.vector_add")
}

#[cfg(feature = "opencl")]
fn opencl_device(_op: &'static str) -> Result<Box<dyn ComputeDevice>> {
    Ok(Box::new(gemmbench::opencl::ClDevice::new()))
}

#[cfg(not(feature = "opencl"))]
fn opencl_device(op: &'static str) -> Result<Box<dyn ComputeDevice>> {
    Err(BenchError::InvalidArgument {
        op,
        msg: "opencl backend requires building with --features opencl".to_string(),
    })
}

fn emit_report(report: &RunReport, format: &str, op: &'static str) -> Result<()> {
    match format {
        "table" => {
            report.print();
            Ok(())
        }
        "json" => {
            let json = serde_json::to_string_pretty(report).map_err(|err| BenchError::Report {
                op,
                msg: format!("failed to serialize report: {err}"),
            })?;
            println!("{json}");
            Ok(())
        }
        other => Err(BenchError::InvalidArgument {
            op,
            msg: format!("unknown format {other}"),
        }),
    }
}

fn print_usage() {
    println!(
        "gemmbench_cli\n\nUSAGE:\n  gemmbench_cli matmul [options]\n  gemmbench_cli vector-add [options]\n\nOPTIONS (matmul):\n  --backend <name>   Execution backend: cpu|sim|opencl (default: cpu)\n  --format <name>    Output format: table|json (default: table)\n\nOPTIONS (vector-add):\n  --backend <name>   Execution backend: sim|opencl (default: sim)\n  --format <name>    Output format: table|json (default: table)\n\n  -h, --help         Print this help text\n"
    );
}

struct ArgParser {
    args: Vec<String>,
}

impl ArgParser {
    fn new(args: &[String]) -> Self {
        Self {
            args: args.to_vec(),
        }
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let flag = format!("--{key}");
        match self.args.iter().position(|value| value == &flag) {
            Some(idx) => match self.args.get(idx + 1) {
                Some(value) => Ok(Some(value.clone())),
                None => Err(BenchError::InvalidArgument {
                    op: "cli",
                    msg: format!("{flag} requires a value"),
                }),
            },
            None => Ok(None),
        }
    }
}
