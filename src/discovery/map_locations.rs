use crate::models::map_location::{ListPoint, LocationKind, MapLocation, VisitPoint};

fn is_same_place(location: &MapLocation, point: &ListPoint) -> bool {
    location.name == point.name
        && location.latitude == point.latitude
        && location.longitude == point.longitude
}

/// Merge visit pins and list pins into one set of map locations.
///
/// Every visit is kept. A list entry is dropped when a location with exactly
/// the same name and coordinate has already been accumulated, so a restaurant
/// that was both visited and saved shows a single visit pin.
pub fn merge_map_locations(
    visits: Vec<VisitPoint>,
    list_items: Vec<ListPoint>,
) -> Vec<MapLocation> {
    let mut locations: Vec<MapLocation> = Vec::with_capacity(visits.len() + list_items.len());

    for visit in visits {
        locations.push(MapLocation {
            id: format!("checkin-{}", visit.check_in_id),
            name: visit.name,
            latitude: visit.latitude,
            longitude: visit.longitude,
            kind: LocationKind::CheckIn,
            address: Some(visit.address),
            rating: visit.rating,
            list_name: None,
            list_color: None,
        });
    }

    for item in list_items {
        if locations.iter().any(|location| is_same_place(location, &item)) {
            continue;
        }

        locations.push(MapLocation {
            id: format!("list-{}", item.restaurant_id),
            name: item.name,
            latitude: item.latitude,
            longitude: item.longitude,
            kind: LocationKind::List,
            address: Some(item.address),
            rating: None,
            list_name: Some(item.list_name),
            list_color: Some(item.list_color),
        });
    }

    locations
}
