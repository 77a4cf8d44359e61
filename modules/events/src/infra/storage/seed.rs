use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::contract::model::{Event, EventStatus};
use crate::domain::repo::EventsRepository;

struct DemoEvent {
    name: &'static str,
    description: &'static str,
    location: &'static str,
    date: (i32, u32, u32),
    time: &'static str,
    capacity: u32,
    price: f64,
    category: &'static str,
    image: &'static str,
}

const DEMO_EVENTS: [DemoEvent; 5] = [
    DemoEvent {
        name: "¡Temporada digital y Más!",
        description: "Evento de tecnología y innovación digital",
        location: "Lima",
        date: (2024, 7, 15),
        time: "18:00",
        capacity: 100,
        price: 0.0,
        category: "Tecnología",
        image: "img/cards/513126531_1785148272214189_4619596617324041753_n.jpg",
    },
    DemoEvent {
        name: "Dr. Jekyll & Mr. Hyde",
        description: "Obra teatral clásica",
        location: "Arequipa",
        date: (2024, 7, 20),
        time: "19:00",
        capacity: 150,
        price: 25.0,
        category: "Teatro",
        image: "img/cards/513199091_746317388335271_7685396646841333246_n.jpg",
    },
    DemoEvent {
        name: "Meet & Greet",
        description: "Evento de networking y conocimiento",
        location: "Trujillo",
        date: (2024, 7, 30),
        time: "17:00",
        capacity: 80,
        price: 0.0,
        category: "Networking",
        image: "img/cards/513663032_9949232641861444_4757165714216607079_n.jpg",
    },
    DemoEvent {
        name: "Gastronomicon",
        description: "Festival gastronómico",
        location: "Lima",
        date: (2024, 7, 30),
        time: "17:00",
        capacity: 200,
        price: 35.0,
        category: "Gastronomía",
        image: "img/cards/513721327_710115258549179_8599236021205993254_n.jpg",
    },
    DemoEvent {
        name: "Oratoria",
        description: "Taller de técnicas de oratoria y comunicación",
        location: "Lima",
        date: (2024, 7, 30),
        time: "17:00",
        capacity: 60,
        price: 20.0,
        category: "Educación",
        image: "img/cards/513934264_670515809354703_3791911029304559057_n.jpg",
    },
];

/// Inserts the demo catalog. Ids are taken from the repository sequence, so
/// on a fresh repository they are 1 through 5.
pub async fn seed_demo_events(repo: &dyn EventsRepository) -> anyhow::Result<usize> {
    let now = Utc::now();
    for demo in &DEMO_EVENTS {
        let (y, m, d) = demo.date;
        let date = NaiveDate::from_ymd_opt(y, m, d)
            .ok_or_else(|| anyhow::anyhow!("invalid demo date for '{}'", demo.name))?;
        repo.insert(Event {
            id: repo.next_id(),
            name: demo.name.to_string(),
            description: Some(demo.description.to_string()),
            location: demo.location.to_string(),
            date,
            time: demo.time.to_string(),
            capacity: demo.capacity,
            price: demo.price,
            category: demo.category.to_string(),
            image: Some(demo.image.to_string()),
            status: EventStatus::Active,
            created_at: now,
            updated_at: None,
        })
        .await?;
    }
    info!(count = DEMO_EVENTS.len(), "Demo events seeded");
    Ok(DEMO_EVENTS.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::storage::InMemoryEventsRepo;

    #[tokio::test]
    async fn seeds_five_active_events_in_order() {
        let repo = InMemoryEventsRepo::new();
        assert_eq!(seed_demo_events(&repo).await.unwrap(), 5);

        let events = repo.list().await.unwrap();
        let ids: Vec<u64> = events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert!(events.iter().all(Event::is_active));
        assert_eq!(events[1].name, "Dr. Jekyll & Mr. Hyde");
        assert_eq!(events[4].capacity, 60);
    }
}
