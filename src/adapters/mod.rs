//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter     | Implements       | Connects to                     |
//! |-------------|------------------|---------------------------------|
//! | `hardware`  | SignalPort       | four `OutputPin`s (SignalBank)  |
//! |             | SensorProbePort  | LSM6DSO32 over `SpiDevice`      |
//! |             |                  | `NoSensor` for GPIO-only boards |
//! | `log_sink`  | EventSink        | `log` facade (RTT / stderr)     |

pub mod hardware;
pub mod log_sink;
