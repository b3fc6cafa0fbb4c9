// schedule.rs - Rank discovery and partition ownership

use std::fmt;
use std::str::FromStr;

/// Environment variable pairs (rank, size) set by common MPI launchers
pub const RANK_ENV_VARS: &[(&str, &str)] = &[
    ("OMPI_COMM_WORLD_RANK", "OMPI_COMM_WORLD_SIZE"),
    ("PMI_RANK", "PMI_SIZE"),
    ("SLURM_PROCID", "SLURM_NTASKS"),
];

/// How the preprocessor finds its share of the work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// One process per rank, launched by `mpirun`
    Mpi,
    /// A single process using a local thread pool
    Local,
}

impl FromStr for Schedule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mpi" => Ok(Schedule::Mpi),
            "local" => Ok(Schedule::Local),
            _ => Err(format!("Invalid schedule '{}'. Use: mpi, local", s)),
        }
    }
}

impl Schedule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Schedule::Mpi => "mpi",
            Schedule::Local => "local",
        }
    }
}

/// Position of this process among all ranks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldInfo {
    pub rank: usize,
    pub size: usize,
}

impl WorldInfo {
    pub fn single() -> Self {
        Self { rank: 0, size: 1 }
    }

    /// Resolve the world for a schedule from the process environment
    pub fn for_schedule(schedule: Schedule) -> Result<Self, String> {
        match schedule {
            Schedule::Local => Ok(Self::single()),
            Schedule::Mpi => match Self::from_vars(|name| std::env::var(name).ok())? {
                Some(world) => Ok(world),
                None => {
                    eprintln!(
                        "{} ⚠️  No MPI rank variables found in the environment, running as rank 0 of 1",
                        Self::single()
                    );
                    Ok(Self::single())
                }
            },
        }
    }

    /// First complete (rank, size) pair among the known launcher variables
    pub fn from_vars<F>(lookup: F) -> Result<Option<Self>, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        for (rank_var, size_var) in RANK_ENV_VARS {
            let (rank, size) = match (lookup(rank_var), lookup(size_var)) {
                (Some(rank), Some(size)) => (rank, size),
                _ => continue,
            };
            let rank: usize = rank
                .trim()
                .parse()
                .map_err(|_| format!("Invalid {} value '{}'", rank_var, rank))?;
            let size: usize = size
                .trim()
                .parse()
                .map_err(|_| format!("Invalid {} value '{}'", size_var, size))?;
            if size == 0 || rank >= size {
                return Err(format!(
                    "Inconsistent MPI environment: {}={} with {}={}",
                    rank_var, rank, size_var, size
                ));
            }
            return Ok(Some(Self { rank, size }));
        }
        Ok(None)
    }

    /// `[rank r/w] ` when launched under a known launcher, else empty
    pub fn diagnostic_prefix<F>(lookup: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        match Self::from_vars(lookup) {
            Ok(Some(world)) => format!("{} ", world),
            _ => String::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.rank == 0
    }

    /// Partitions are dealt round-robin across ranks
    pub fn owns(&self, partition: usize) -> bool {
        partition % self.size == self.rank
    }

    pub fn owned_partitions(&self, num_partitions: usize) -> Vec<usize> {
        (self.rank..num_partitions).step_by(self.size).collect()
    }
}

impl fmt::Display for WorldInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[rank {}/{}]", self.rank, self.size)
    }
}
