pub mod follower;
pub mod logger;
pub mod pump;
pub mod record;
pub mod sink;
pub mod supervisor;

pub use follower::DockerLogFollower;
pub use supervisor::relay_logs;
