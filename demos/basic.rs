//! Basic circuit breaker usage

use std::time::Duration;

use switchgear::{CircuitBreaker, CircuitError, WindowKind};

fn main() {
    let breaker = CircuitBreaker::builder("payment_api")
        .failure_rate_threshold(50)
        .sliding_window(WindowKind::CountBased, 10)
        .minimum_number_of_calls(4)
        .wait_duration_in_open(Duration::from_secs(5))
        .on_open(|name| println!("🔴 circuit '{name}' opened"))
        .on_half_open(|name| println!("🟡 circuit '{name}' half-open, probing"))
        .on_close(|name| println!("🟢 circuit '{name}' closed"))
        .build()
        .expect("policy is valid");

    println!("initial state: {}", breaker.state());

    println!("--- successful calls ---");
    for i in 1..=2 {
        match breaker.call(move || Ok::<_, String>(format!("payment {i}"))) {
            Ok(result) => println!("✓ {result}"),
            Err(e) => println!("✗ {e}"),
        }
    }

    println!("--- failing calls ---");
    for i in 1..=4 {
        match breaker.call(move || Err::<String, _>(format!("payment {i} failed"))) {
            Ok(_) => println!("✓ success"),
            Err(e) => println!("✗ {e}"),
        }
    }
    println!("state: {}", breaker.state());

    println!("--- calling while open ---");
    match breaker.call(|| Ok::<_, String>("should be refused".to_string())) {
        Ok(_) => println!("✓ success"),
        Err(CircuitError::Rejected { circuit }) => println!("✗ '{circuit}' refused the call"),
        Err(e) => println!("✗ {e}"),
    }

    println!("--- manual recording ---");
    if breaker.acquire_permission() {
        breaker.record_success(Duration::from_millis(3));
        println!("recorded a success");
    } else {
        println!("permission refused, backing off");
    }
}
