mod test_building_scenarios;
