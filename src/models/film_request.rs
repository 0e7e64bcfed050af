use rand::Rng;
use serde::{Deserialize, Serialize};

/// Body of `PUT /api/film`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmRequest {
    pub characters: Vec<String>,
    pub created: String,
    pub director: String,
    pub edited: String,
    pub episode_id: i32,
    pub opening_crawl: String,
    pub planets: Vec<String>,
    pub producer: String,
    pub release_date: String,
    pub species: Vec<String>,
    pub starships: Vec<String>,
    pub title: String,
    pub url: String,
    pub vehicles: Vec<String>,
}

const OPENING_CRAWL: &str = "It is a period of civil war.\n\nRebel spaceships, striking\n\nfrom a hidden base, have won\n\ntheir first victory against\n\nthe evil Galactic Empire.\n\n\n\nDuring the battle, Rebel\n\nspies managed to steal secret\r\nplans to the Empire's\n\nultimate weapon, the DEATH\n\nSTAR, an armored space\n\nstation with enough power\n\nto destroy an entire planet.\n\n\n\nPursued by the Empire's\n\nsinister agents, Princess\n\nLeia races home aboard her\n\nstarship, custodian of the\n\nstolen plans that can save her\n\npeople and restore\n\nfreedom to the galaxy....";

fn swapi_links(kind: &str, ids: &[u32]) -> Vec<String> {
    ids.iter()
        .map(|id| format!("https://swapi.dev/api/{}/{}/", kind, id))
        .collect()
}

impl FilmRequest {
    /// Realistic film payload with a randomized title, so repeated PUTs are
    /// not byte-identical.
    pub fn random() -> Self {
        let n: u32 = rand::rng().random_range(0..1000);
        FilmRequest {
            characters: swapi_links("people", &[1, 2, 3, 4, 5]),
            created: "2014-12-10T14:23:31.880000Z".to_string(),
            director: "George Lucas".to_string(),
            edited: "2014-12-12T11:24:39.858000Z".to_string(),
            episode_id: 4,
            opening_crawl: OPENING_CRAWL.to_string(),
            planets: swapi_links("planets", &[1, 2, 3]),
            producer: "Gary Kurtz, Rick McCallum".to_string(),
            release_date: "1977-05-25".to_string(),
            species: swapi_links("species", &[1, 2, 3]),
            starships: swapi_links("starships", &[2, 3, 5]),
            title: format!("A New Hope - Test {}", n),
            url: "https://swapi.dev/api/films/1/".to_string(),
            vehicles: swapi_links("vehicles", &[4, 6, 7]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let body = serde_json::to_value(FilmRequest::random()).unwrap();
        for key in [
            "characters",
            "created",
            "director",
            "edited",
            "episode_id",
            "opening_crawl",
            "planets",
            "producer",
            "release_date",
            "species",
            "starships",
            "title",
            "url",
            "vehicles",
        ] {
            assert!(body.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(body["episode_id"], 4);
        assert!(body["title"].as_str().unwrap().starts_with("A New Hope - Test "));
        assert_eq!(body["planets"][0], "https://swapi.dev/api/planets/1/");
    }
}
